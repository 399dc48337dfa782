use daikin_skyport::{FanMode, FanSpeed, HvacMode, SchedulePart, SensorKind, Weekday};

#[test]
fn hvac_mode_roundtrip() {
    for mode in [
        HvacMode::Off,
        HvacMode::Heat,
        HvacMode::Cool,
        HvacMode::Auto,
        HvacMode::AuxHeat,
    ] {
        let v = mode.as_skyport_value();
        assert_eq!(HvacMode::from_skyport_value(v as u64), Some(mode));
    }
    assert_eq!(HvacMode::from_skyport_value(9), None);
}

#[test]
fn fan_mode_roundtrip() {
    for mode in [FanMode::Auto, FanMode::On, FanMode::Schedule] {
        let v = mode.as_skyport_value();
        assert_eq!(FanMode::from_skyport_value(v as u64), Some(mode));
    }
}

#[test]
fn fan_speed_values() {
    assert_eq!(FanSpeed::Low.as_skyport_value(), 0);
    assert_eq!(FanSpeed::Medium.as_skyport_value(), 1);
    assert_eq!(FanSpeed::High.as_skyport_value(), 2);
    assert_eq!(FanSpeed::from_skyport_value(2), Some(FanSpeed::High));
}

#[test]
fn schedule_prefix_per_day() {
    let days = [
        (Weekday::Mon, "schedMonPart1"),
        (Weekday::Thu, "schedThuPart1"),
        (Weekday::Sat, "schedSatPart1"),
    ];
    for (day, expected) in days {
        assert_eq!(SchedulePart::new(day, 1).prefix(), expected);
    }
}

#[test]
fn sensor_kind_labels() {
    assert_eq!(SensorKind::FrequencyPercent.as_str(), "frequency_percent");
    assert_eq!(SensorKind::Voc.as_str(), "VOC");
}
