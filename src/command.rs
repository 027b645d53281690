//! Line-oriented host command parser.
//!
//! Grammar, case-insensitive, leading whitespace ignored:
//! - `F=<digits>...`  set the sampling frequency in Hz; text after the
//!   leading digits is ignored, so `F=500Hz` means 500
//! - `H...`           print help, whatever follows
//!
//! Anything else is dropped without a reply.

use heapless::Vec;

use crate::config::COMMAND_LINE_CAPACITY;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Requested frequency, not yet range checked.
    SetFrequency(u32),
    Help,
}

/// Parses one line, without its line feed.
pub fn parse_line(line: &[u8]) -> Option<Command> {
    parse(line, false)
}

/// `truncated` marks a line cut at the buffer capacity: a frequency whose
/// digits run into the cut is ignored.
fn parse(line: &[u8], truncated: bool) -> Option<Command> {
    match line.trim_ascii_start() {
        [f, b'=', arg @ ..] if f.eq_ignore_ascii_case(&b'F') => {
            let arg = arg.trim_ascii_start();
            let digits = arg.iter().take_while(|b| b.is_ascii_digit()).count();
            if digits == 0 || (truncated && digits == arg.len()) {
                return None;
            }
            leading_number(&arg[..digits]).map(Command::SetFrequency)
        }
        [h, ..] if h.eq_ignore_ascii_case(&b'H') => Some(Command::Help),
        _ => None,
    }
}

/// Decimal value of an all-digit slice; `None` past `u32::MAX`.
fn leading_number(digits: &[u8]) -> Option<u32> {
    digits.iter().try_fold(0u32, |acc, &d| {
        acc.checked_mul(10)?.checked_add(u32::from(d - b'0'))
    })
}

/// Accumulates host bytes into lines. Never blocks; a partial line simply
/// waits for more bytes.
#[derive(Default)]
pub struct CommandInterpreter {
    line: Vec<u8, COMMAND_LINE_CAPACITY>,
    truncated: bool,
}

impl CommandInterpreter {
    pub const fn new() -> Self {
        Self {
            line: Vec::new(),
            truncated: false,
        }
    }

    /// Feeds one byte. A line feed parses the bytes gathered since the
    /// previous one and clears the buffer whatever the outcome. Bytes past
    /// the capacity are dropped; the kept prefix is still parsed.
    pub fn push(&mut self, byte: u8) -> Option<Command> {
        if byte != b'\n' {
            if self.line.push(byte).is_err() && !self.truncated {
                self.truncated = true;
                debug!("command line exceeds {} bytes, truncating", COMMAND_LINE_CAPACITY);
            }
            return None;
        }

        let command = parse(&self.line, self.truncated);
        self.line.clear();
        self.truncated = false;
        command
    }

    #[cfg(test)]
    fn pending(&self) -> &[u8] {
        &self.line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(interp: &mut CommandInterpreter, bytes: &[u8]) -> std::vec::Vec<Command> {
        bytes.iter().filter_map(|&b| interp.push(b)).collect()
    }

    #[test]
    fn parses_frequency_case_insensitive_and_trimmed() {
        assert_eq!(parse_line(b"F=500"), Some(Command::SetFrequency(500)));
        assert_eq!(parse_line(b"f=500"), Some(Command::SetFrequency(500)));
        assert_eq!(parse_line(b"  F=3200 \r"), Some(Command::SetFrequency(3200)));
        assert_eq!(parse_line(b"F= 42"), Some(Command::SetFrequency(42)));
        // range is the scheduler's call
        assert_eq!(parse_line(b"F=0"), Some(Command::SetFrequency(0)));
    }

    #[test]
    fn non_numeric_frequency_is_ignored() {
        assert_eq!(parse_line(b"F=abc"), None);
        assert_eq!(parse_line(b"F="), None);
        assert_eq!(parse_line(b"F=-5"), None);
        assert_eq!(parse_line(b"F=99999999999"), None);
        assert_eq!(parse_line(b"F 500"), None);
    }

    #[test]
    fn frequency_takes_leading_digits_only() {
        assert_eq!(parse_line(b"F=500Hz"), Some(Command::SetFrequency(500)));
        assert_eq!(parse_line(b"F=12.5"), Some(Command::SetFrequency(12)));
        assert_eq!(parse_line(b"F=250\xFF"), Some(Command::SetFrequency(250)));
    }

    #[test]
    fn any_h_prefixed_line_is_help() {
        assert_eq!(parse_line(b"H"), Some(Command::Help));
        assert_eq!(parse_line(b"help"), Some(Command::Help));
        assert_eq!(parse_line(b"  Hxyz=1"), Some(Command::Help));
        assert_eq!(parse_line(b"H\xFF"), Some(Command::Help));
        assert_eq!(parse_line(b"H\r"), Some(Command::Help));
    }

    #[test]
    fn help_with_invalid_utf8_tail_is_recognised() {
        let mut interp = CommandInterpreter::new();
        assert_eq!(feed(&mut interp, b"H\xFF\n"), vec![Command::Help]);
    }

    #[test]
    fn overlong_help_line_still_prints_help() {
        let mut interp = CommandInterpreter::new();
        let mut long = std::vec::Vec::from(&b"Help"[..]);
        long.extend(core::iter::repeat(b'x').take(80));
        long.push(b'\n');
        assert_eq!(long.len(), 85);
        assert_eq!(feed(&mut interp, &long), vec![Command::Help]);
        assert!(interp.pending().is_empty());
    }

    #[test]
    fn unknown_and_empty_lines_are_dropped() {
        assert_eq!(parse_line(b""), None);
        assert_eq!(parse_line(b"   "), None);
        assert_eq!(parse_line(b"X=1"), None);
        assert_eq!(parse_line(&[0xFF, 0xFE]), None);
    }

    #[test]
    fn partial_lines_accumulate_across_pushes() {
        let mut interp = CommandInterpreter::new();
        assert!(feed(&mut interp, b"F=5").is_empty());
        assert_eq!(interp.pending(), b"F=5");
        assert_eq!(feed(&mut interp, b"00\n"), vec![Command::SetFrequency(500)]);
        assert!(interp.pending().is_empty());
    }

    #[test]
    fn several_lines_in_one_chunk_parse_in_order() {
        let mut interp = CommandInterpreter::new();
        let cmds = feed(&mut interp, b"F=100\nbogus\nH\nF=7\n");
        assert_eq!(
            cmds,
            vec![
                Command::SetFrequency(100),
                Command::Help,
                Command::SetFrequency(7)
            ]
        );
    }

    #[test]
    fn buffer_cleared_after_unparsable_line() {
        let mut interp = CommandInterpreter::new();
        assert!(feed(&mut interp, b"garbage\n").is_empty());
        assert!(interp.pending().is_empty());
        assert_eq!(feed(&mut interp, b"H\n"), vec![Command::Help]);
    }

    #[test]
    fn overlong_frequency_line_keeps_complete_prefix() {
        let mut interp = CommandInterpreter::new();
        let mut long = std::vec::Vec::from(&b"F=100"[..]);
        long.extend(core::iter::repeat(b' ').take(COMMAND_LINE_CAPACITY));
        long.push(b'\n');
        assert_eq!(feed(&mut interp, &long), vec![Command::SetFrequency(100)]);
    }

    #[test]
    fn frequency_cut_at_capacity_is_ignored() {
        let mut interp = CommandInterpreter::new();
        // the cut lands inside "1000"
        let mut long = std::vec::Vec::from(&b"F="[..]);
        long.extend(core::iter::repeat(b' ').take(COMMAND_LINE_CAPACITY - 4));
        long.extend_from_slice(b"1000\n");
        assert!(feed(&mut interp, &long).is_empty());
        assert_eq!(feed(&mut interp, b"F=100\n"), vec![Command::SetFrequency(100)]);
    }
}
