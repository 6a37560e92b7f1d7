use std::env;
use std::path::PathBuf;

const DEFAULT_DATA_DIR: &str = "./cookbook-data";
const DEFAULT_WINDOW: (u32, u32) = (1280, 860);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub user_id: Option<String>,
    pub window_width: u32,
    pub window_height: u32,
}

impl Config {
    /// Reads `COOKBOOK_DATA_DIR`, `COOKBOOK_USER` and `COOKBOOK_WINDOW`. A
    /// positional argument overrides the data directory.
    pub fn from_env() -> Self {
        Self::from_values(
            env::args().nth(1),
            env::var("COOKBOOK_DATA_DIR").ok(),
            env::var("COOKBOOK_USER").ok(),
            env::var("COOKBOOK_WINDOW").ok(),
        )
    }

    fn from_values(
        arg: Option<String>,
        data_dir: Option<String>,
        user: Option<String>,
        window: Option<String>,
    ) -> Self {
        let data_dir = arg
            .or(data_dir)
            .filter(|dir| !dir.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from);
        let user_id = user
            .map(|user| user.trim().to_string())
            .filter(|user| !user.is_empty());
        let (window_width, window_height) = match window.as_deref() {
            None => DEFAULT_WINDOW,
            Some(value) => parse_window(value).unwrap_or_else(|| {
                log::warn!("Ignoring invalid COOKBOOK_WINDOW {:?}, using {}x{}", value, DEFAULT_WINDOW.0, DEFAULT_WINDOW.1);
                DEFAULT_WINDOW
            }),
        };
        Self {
            data_dir,
            user_id,
            window_width,
            window_height,
        }
    }
}

fn parse_window(value: &str) -> Option<(u32, u32)> {
    let (width, height) = value.trim().split_once(['x', 'X'])?;
    let width = width.trim().parse::<u32>().ok()?;
    let height = height.trim().parse::<u32>().ok()?;
    (width > 0 && height > 0).then_some((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = Config::from_values(None, None, None, None);
        assert_eq!(config.data_dir, PathBuf::from("./cookbook-data"));
        assert_eq!(config.user_id, None);
        assert_eq!((config.window_width, config.window_height), (1280, 860));
    }

    #[test]
    fn argument_wins_over_environment() {
        let config = Config::from_values(
            Some(String::from("/tmp/book")),
            Some(String::from("/srv/book")),
            Some(String::from(" chef ")),
            Some(String::from("900X1400")),
        );
        assert_eq!(config.data_dir, PathBuf::from("/tmp/book"));
        assert_eq!(config.user_id.as_deref(), Some("chef"));
        assert_eq!((config.window_width, config.window_height), (900, 1400));
    }

    #[test]
    fn invalid_window_falls_back() {
        let config = Config::from_values(None, None, Some(String::new()), Some(String::from("wide")));
        assert_eq!(config.user_id, None);
        assert_eq!((config.window_width, config.window_height), (1280, 860));
        assert_eq!(parse_window("0x10"), None);
    }
}
