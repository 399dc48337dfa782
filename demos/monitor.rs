use daikin_skyport::{DeviceSession, Event};
use std::env;
use std::time::Duration;

#[tokio::main]
async fn main() -> daikin_skyport::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let config = args
        .get(1)
        .expect("usage: monitor <config-file> [--interval <secs>]");
    let interval: u64 = args
        .iter()
        .position(|a| a == "--interval")
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
        .unwrap_or(180);

    let mut session = DeviceSession::builder()
        .config_file(config)
        .on_event(|event| match event {
            Event::DeviceDiscovered { id, name } => println!("found {name} ({id})"),
            Event::FieldChanged {
                device_id,
                field,
                old,
                new,
            } => println!("[{device_id}] {field}: {old} -> {new}"),
        })
        .on_snapshot(|devices| {
            for device in devices {
                println!(
                    "[{}] indoor: {:?}\u{00b0}C {:?}% | outdoor: {:?}\u{00b0}C | mode: {:?} | heat/cool: {:?}/{:?}",
                    device.name,
                    device.indoor_temperature(),
                    device.indoor_humidity(),
                    device.outdoor_temperature(),
                    device.hvac_mode(),
                    device.heat_setpoint(),
                    device.cool_setpoint(),
                );
            }
        })
        .build()?;

    println!("Connecting with {config}...");
    session.connect().await?;
    println!("Connected. Polling every {interval}s...");

    loop {
        tokio::time::sleep(Duration::from_secs(interval)).await;
        if let Err(e) = session.update().await {
            eprintln!("Update error: {e}");
        }
    }
}
