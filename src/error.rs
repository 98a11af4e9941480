use std::fmt;

#[derive(Debug)]
pub enum InklineError {
    NoHtmlProvided,
    Io(std::io::Error),
}

impl fmt::Display for InklineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InklineError::NoHtmlProvided => write!(f, "no HTML provided"),
            InklineError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for InklineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InklineError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for InklineError {
    fn from(value: std::io::Error) -> Self {
        InklineError::Io(value)
    }
}
