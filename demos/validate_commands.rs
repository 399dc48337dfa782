use daikin_skyport::{Device, DeviceSession, MessageLogMode};
use std::env;
use std::io::{self, BufRead, Write as _};

enum Step {
    Away(bool),
    Resume,
    TempHold { heat: f64, cool: f64 },
    FanClean(bool),
}

#[tokio::main]
async fn main() -> daikin_skyport::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let config = args
        .get(1)
        .expect("usage: validate_commands <config-file> [--device <index>] [--no-log]");
    let no_log = args.iter().any(|a| a == "--no-log");
    let index: usize = args
        .iter()
        .position(|a| a == "--device")
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let mut builder = DeviceSession::builder().config_file(config);

    let log_path = if !no_log {
        let ts = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = format!("logs/validate_{ts}.ndjson");
        std::fs::create_dir_all("logs").ok();
        println!("Logging all requests/responses to {path}");
        builder = builder.message_log(MessageLogMode::Full, &path);
        Some(path)
    } else {
        None
    };

    let mut session = builder.build()?;
    println!("Connecting with {config}...");
    session.connect().await?;

    let device = session
        .device(index)
        .unwrap_or_else(|| panic!("device {index} not found"))
        .clone();
    println!("\n=== Current State (device {index}: {}) ===", device.name);
    print_device(&device);

    let orig_away = device.flag("geofencingAway").unwrap_or(false);
    let mut cases: Vec<(&str, Step, Step)> = vec![
        ("Away Mode", Step::Away(!orig_away), Step::Away(orig_away)),
        ("Fan Clean", Step::FanClean(true), Step::FanClean(false)),
    ];
    if let (Some(heat), Some(cool)) = (device.heat_setpoint(), device.cool_setpoint()) {
        cases.push((
            "Temporary Hold",
            Step::TempHold {
                heat: heat + 1.0,
                cool: cool + 1.0,
            },
            Step::Resume,
        ));
    } else {
        println!("Skipping hold test (no current heat+cool setpoints)");
    }

    let total = cases.len();
    for (i, (name, apply, revert)) in cases.into_iter().enumerate() {
        println!("----------------------------------------");
        println!("Test {}/{total}: {name}", i + 1);
        wait_for_enter("Press Enter to apply (Ctrl-C to abort)...");
        run(&mut session, index, apply).await?;
        session.update().await?;
        if let Some(d) = session.device(index) {
            print_device(d);
        }

        wait_for_enter("Verify at thermostat, then press Enter to revert...");
        run(&mut session, index, revert).await?;
        session.update().await?;
        if let Some(d) = session.device(index) {
            print_device(d);
        }
        println!("  Reverted\n");
    }

    println!("All tests complete.");
    if let Some(path) = log_path {
        println!("Full request/response log: {path}");
    }
    Ok(())
}

async fn run(session: &mut DeviceSession, index: usize, step: Step) -> daikin_skyport::Result<()> {
    let resp = match step {
        Step::Away(away) => session.set_away(index, away, None, None).await?,
        Step::Resume => session.resume_program(index).await?,
        Step::TempHold { heat, cool } => {
            session
                .set_temp_hold(index, Some(heat), Some(cool), None)
                .await?
        }
        Step::FanClean(active) => session.set_fan_clean(index, active).await?,
    };
    println!("  Command accepted: {resp}");
    Ok(())
}

fn print_device(device: &Device) {
    println!(
        "  {} | temp: {:?} | heat_sp: {:?} | cool_sp: {:?} | mode: {:?} | away: {:?}",
        device.name,
        device.indoor_temperature(),
        device.heat_setpoint(),
        device.cool_setpoint(),
        device.hvac_mode(),
        device.flag("geofencingAway"),
    );
}

fn wait_for_enter(prompt: &str) {
    print!("  {prompt} ");
    io::stdout().flush().unwrap();
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).unwrap();
}
