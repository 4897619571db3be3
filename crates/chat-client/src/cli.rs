use chat_client::ResponseMode;
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOptions {
    pub relay_url: Option<String>,
    pub mode: Option<ResponseMode>,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("unknown argument: {0}")]
    UnknownArgument(String),
    #[error("missing value for argument: {0}")]
    MissingValue(String),
    #[error("invalid --mode value: {0}")]
    InvalidMode(String),
    #[error("--relay-url must start with http:// or https://")]
    InvalidRelayUrl,
    #[error("help requested")]
    HelpRequested,
}

impl CliOptions {
    pub fn parse<I>(args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut options = Self::default();

        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--help" | "-h" => return Err(CliError::HelpRequested),
                "--mode" => {
                    let value = iter.next().ok_or(CliError::MissingValue(arg.clone()))?;
                    options.mode = Some(parse_mode(&value)?);
                }
                "--relay-url" => {
                    let value = iter.next().ok_or(CliError::MissingValue(arg.clone()))?;
                    let value = value.trim();
                    if !value.starts_with("http://") && !value.starts_with("https://") {
                        return Err(CliError::InvalidRelayUrl);
                    }
                    options.relay_url = Some(value.to_string());
                }
                unknown => return Err(CliError::UnknownArgument(unknown.to_string())),
            }
        }

        Ok(options)
    }
}

fn parse_mode(value: &str) -> Result<ResponseMode, CliError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "batch" => Ok(ResponseMode::Batch),
        "stream" | "streaming" => Ok(ResponseMode::Streaming),
        _ => Err(CliError::InvalidMode(value.to_string())),
    }
}
