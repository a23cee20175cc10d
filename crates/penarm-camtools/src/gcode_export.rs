//! G-code export for dry runs

use penarm_core::MotionCommand;

/// Render commands as a G-code program
///
/// The program starts in absolute mode and holds one command per line.
pub fn export_gcode(commands: &[MotionCommand]) -> String {
    let mut program = String::with_capacity(commands.len() * 32 + 64);
    program.push_str("; penarm drawing\n");
    program.push_str(&format!("; {} commands\n", commands.len()));
    program.push_str("G90\n");
    for command in commands {
        program.push_str(&command.to_gcode());
        program.push('\n');
    }
    program
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_header_and_lines() {
        let commands = vec![
            MotionCommand::travel(10.0, 20.0, 16.0, 8000.0),
            MotionCommand::draw(10.0, 20.0, 0.0, 2000.0),
        ];
        let program = export_gcode(&commands);
        let lines: Vec<&str> = program.lines().collect();
        assert_eq!(lines[1], "; 2 commands");
        assert_eq!(lines[2], "G90");
        assert_eq!(lines[3], "G0 X10.000 Y20.000 Z16.000 F8000");
        assert_eq!(lines[4], "G1 X10.000 Y20.000 Z0.000 F2000");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_export_empty() {
        assert!(export_gcode(&[]).ends_with("G90\n"));
    }
}
