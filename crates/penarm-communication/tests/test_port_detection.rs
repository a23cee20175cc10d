//! Port enumeration and arm auto-detection

use penarm_communication::{find_arm_port, list_ports, SerialPortInfo};

#[test]
fn test_detected_port_comes_from_listing() {
    // enumeration may legitimately fail in sandboxes without sysfs access
    let Ok(ports) = list_ports() else {
        return;
    };
    if let Some(port) = find_arm_port(&ports) {
        assert!(ports.iter().any(|p| p.port_name == port && p.looks_like_arm()));
    }
}

#[test]
fn test_detection_order() {
    let ports = vec![
        SerialPortInfo::new("/dev/ttyAMA0", "Unknown"),
        SerialPortInfo::new("/dev/ttyACM0", "USB Rotrics DexArm").with_usb_ids(0x0483, 0x5740),
        SerialPortInfo::new("/dev/ttyUSB0", "USB FTDI Serial Port"),
    ];
    assert_eq!(find_arm_port(&ports).as_deref(), Some("/dev/ttyACM0"));
}
