use assist_core::FontFamily;
use assist_core::customization::{FONT_SIZE, LINE_HEIGHT, SPEECH_RATE, Slider};
use std::str::FromStr;

pub const HELP: &str = "\
Commands:
  profiles               list the learning profiles
  profile <id>           toggle a profile (e.g. profile Reading & Language Support)
  type <text>            replace the question with <text>
  clear                  clear the question
  dictate                start or stop dictation
  hear <text>            say <text> into the microphone while dictating
  ask                    submit the question
  speak                  read the response aloud
  stop                   stop reading
  voices                 list the English voices
  voice <id>             choose a voice
  rate <0.5-2.0>         set the reading rate
  font-size <0.8-2.0>    set the response font size
  line-height <1.5-2.5>  set the response line height
  font <sans|serif|mono> set the response font
  show                   show the question, profiles, response and display settings
  help                   show this help
  quit                   exit";

/// One line typed at the console.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Help,
    Profiles,
    Profile(String),
    Type(String),
    Clear,
    Dictate,
    Hear(String),
    Ask,
    Speak,
    Stop,
    Voices,
    Voice(String),
    Rate(f32),
    FontSize(f32),
    LineHeight(f32),
    Font(FontFamily),
    Show,
    Quit,
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}', type 'help' for a list")]
    Unknown(String),
    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),
    #[error("'{0}' is not a number")]
    InvalidNumber(String),
    #[error("{0}")]
    InvalidFont(String),
}

fn required(name: &'static str, rest: &str) -> Result<String, ParseError> {
    if rest.is_empty() {
        Err(ParseError::MissingArgument(name))
    } else {
        Ok(rest.to_string())
    }
}

/// Parses a slider value, then clamps and snaps it to the slider.
fn slider(name: &'static str, rest: &str, slider: Slider) -> Result<f32, ParseError> {
    let raw = required(name, rest)?;
    let value = raw
        .parse::<f32>()
        .map_err(|_| ParseError::InvalidNumber(raw.clone()))?;
    if !value.is_finite() {
        return Err(ParseError::InvalidNumber(raw));
    }
    Ok(slider.clamp(value))
}

impl FromStr for ConsoleCommand {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ParseError::Empty);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_lowercase().as_str() {
            "help" | "?" => Self::Help,
            "profiles" => Self::Profiles,
            "profile" => Self::Profile(required("profile", rest)?),
            "type" => Self::Type(required("type", rest)?),
            "clear" => Self::Clear,
            "dictate" | "mic" => Self::Dictate,
            "hear" => Self::Hear(required("hear", rest)?),
            "ask" | "submit" => Self::Ask,
            "speak" | "play" => Self::Speak,
            "stop" => Self::Stop,
            "voices" => Self::Voices,
            "voice" => Self::Voice(required("voice", rest)?),
            "rate" => Self::Rate(slider("rate", rest, SPEECH_RATE)?),
            "font-size" => Self::FontSize(slider("font-size", rest, FONT_SIZE)?),
            "line-height" => Self::LineHeight(slider("line-height", rest, LINE_HEIGHT)?),
            "font" => Self::Font(
                required("font", rest)?
                    .parse::<FontFamily>()
                    .map_err(ParseError::InvalidFont)?,
            ),
            "show" => Self::Show,
            "quit" | "exit" => Self::Quit,
            other => return Err(ParseError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<ConsoleCommand, ParseError> {
        line.parse()
    }

    #[test]
    fn test_profile_ids_keep_their_spaces() {
        assert_eq!(
            parse("profile   Vision & Screen-Reader Support "),
            Ok(ConsoleCommand::Profile("Vision & Screen-Reader Support".to_string()))
        );
    }

    #[test]
    fn test_sliders_are_clamped_and_snapped() {
        assert_eq!(parse("font-size 1.43"), Ok(ConsoleCommand::FontSize(1.4)));
        assert_eq!(parse("line-height 9"), Ok(ConsoleCommand::LineHeight(2.5)));
        assert_eq!(parse("rate 0.1"), Ok(ConsoleCommand::Rate(0.5)));
        assert_eq!(
            parse("rate quick"),
            Err(ParseError::InvalidNumber("quick".to_string()))
        );
        assert_eq!(parse("rate NaN"), Err(ParseError::InvalidNumber("NaN".to_string())));
    }

    #[test]
    fn test_font_family() {
        assert_eq!(parse("font Serif"), Ok(ConsoleCommand::Font(FontFamily::Serif)));
        assert!(matches!(parse("font papyrus"), Err(ParseError::InvalidFont(_))));
    }

    #[test]
    fn test_missing_arguments_and_unknown_commands() {
        assert_eq!(parse("type"), Err(ParseError::MissingArgument("type")));
        assert_eq!(parse("   "), Err(ParseError::Empty));
        assert_eq!(parse("dance"), Err(ParseError::Unknown("dance".to_string())));
    }

    #[test]
    fn test_simple_commands_and_aliases() {
        assert_eq!(parse("ASK"), Ok(ConsoleCommand::Ask));
        assert_eq!(parse("mic"), Ok(ConsoleCommand::Dictate));
        assert_eq!(parse("hear hello world"), Ok(ConsoleCommand::Hear("hello world".to_string())));
        assert_eq!(parse("exit"), Ok(ConsoleCommand::Quit));
    }
}
