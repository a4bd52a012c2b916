use anyhow::{Result, bail};
use std::path::PathBuf;

/// A slash command typed into the input line
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Set the API key; without a value the key is cleared
    Key(Option<String>),
    Open(PathBuf),
    Clear,
    Model(Option<String>),
    Models,
    Help,
    Quit,
}

pub const HELP: &str = "\
Available commands:
  /key <api-key>   Set your Gemini API key (/key alone clears it)
  /open <path>     Upload a PDF and start a new chat about it
  /clear           Clear chat history and the loaded document
  /model [name]    Show or change the model used for the next document
  /models          List models that can chat
  /help            Show this help
  /quit            Exit
Esc cancels a running upload or request.";

/// Prefix whose argument is masked on screen and kept out of history
pub const SECRET_PREFIX: &str = "/key";

impl Command {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let Some(body) = input.strip_prefix('/') else {
            bail!("Commands start with '/'");
        };
        let (name, arg) = match body.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, Some(arg.trim()).filter(|a| !a.is_empty())),
            None => (body, None),
        };

        match name {
            "key" => Ok(Command::Key(arg.map(str::to_string))),
            "open" => match arg {
                Some(path) => Ok(Command::Open(expand_path(path))),
                None => bail!("Usage: /open <path>"),
            },
            "clear" => Ok(Command::Clear),
            "model" => Ok(Command::Model(arg.map(str::to_string))),
            "models" => Ok(Command::Models),
            "help" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => bail!("Unknown command: /{} (try /help)", other),
        }
    }
}

/// Whether the line carries a secret that must not be shown or remembered
pub fn is_secret(input: &str) -> bool {
    let input = input.trim_start();
    input == SECRET_PREFIX
        || input
            .strip_prefix(SECRET_PREFIX)
            .is_some_and(|rest| rest.starts_with(char::is_whitespace))
}

/// Input as it should be drawn: the argument of `/key` becomes asterisks
pub fn mask_input(input: &str) -> String {
    if !is_secret(input) {
        return input.to_string();
    }
    let offset = input.len() - input.trim_start().len() + SECRET_PREFIX.len();
    let (visible, secret) = input.split_at(offset);
    let hidden: String = secret
        .chars()
        .map(|c| if c.is_whitespace() { c } else { '*' })
        .collect();
    format!("{}{}", visible, hidden)
}

/// Strip quotes left by drag-and-drop and expand a leading `~`
fn expand_path(raw: &str) -> PathBuf {
    let raw = raw
        .strip_prefix(['"', '\''])
        .and_then(|r| r.strip_suffix(['"', '\'']))
        .unwrap_or(raw);

    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse("/key  abc123 ").unwrap(),
            Command::Key(Some("abc123".to_string()))
        );
        assert_eq!(Command::parse("/key").unwrap(), Command::Key(None));
        assert_eq!(
            Command::parse("/open report.pdf").unwrap(),
            Command::Open(PathBuf::from("report.pdf"))
        );
        assert_eq!(Command::parse("/clear").unwrap(), Command::Clear);
        assert_eq!(Command::parse("/model").unwrap(), Command::Model(None));
        assert_eq!(
            Command::parse("/model gemini-1.5-flash").unwrap(),
            Command::Model(Some("gemini-1.5-flash".to_string()))
        );
        assert_eq!(Command::parse("/models").unwrap(), Command::Models);
        assert_eq!(Command::parse("/quit").unwrap(), Command::Quit);
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse("/open").unwrap_err().to_string().contains("Usage"));
        assert!(Command::parse("/frobnicate").unwrap_err().to_string().contains("/frobnicate"));
        assert!(Command::parse("hello").is_err());
    }

    #[test]
    fn test_open_path_with_spaces_and_quotes() {
        assert_eq!(
            Command::parse("/open '/tmp/My Paper.pdf'").unwrap(),
            Command::Open(PathBuf::from("/tmp/My Paper.pdf"))
        );
        assert_eq!(
            Command::parse("/open /tmp/My Paper.pdf").unwrap(),
            Command::Open(PathBuf::from("/tmp/My Paper.pdf"))
        );
    }

    #[test]
    fn test_mask_key_argument() {
        assert_eq!(mask_input("/key abc"), "/key ***");
        assert_eq!(mask_input("/key"), "/key");
        assert_eq!(mask_input("/keys abc"), "/keys abc");
        assert_eq!(mask_input("hello"), "hello");
        assert!(is_secret("/key secret"));
        assert!(!is_secret("/keynote"));
    }
}
