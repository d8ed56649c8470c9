//! On-disk preferences, saved and loaded from the platform preference dir.

const DOCUMENTATION: &str = r"# Snapdesk preferences. Formatting and comments in this file are not preserved.
#
# command_prefix: what a chat line must start with to be treated as a command.
# remote_desktop_exe: the exact executable filename the rdp command hunts for
#                     across all mounted volumes.

";

#[must_use]
pub fn preferences_dir() -> Option<std::path::PathBuf> {
    let mut base_dir = dirs::preference_dir()?;
    base_dir.push(env!("CARGO_PKG_NAME"));
    Some(base_dir)
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub command_prefix: String,
    pub remote_desktop_exe: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command_prefix: "/".to_owned(),
            remote_desktop_exe: "AnyDesk.exe".to_owned(),
        }
    }
}

impl Config {
    const FILENAME: &'static str = "config.toml";

    /// User's preferences, or defaults if they're missing or unreadable.
    /// A malformed file never stops startup, it just logs.
    #[must_use]
    pub fn load_or_default() -> Self {
        let Some(mut path) = preferences_dir() else {
            log::warn!("Preferences weren't available, defaulting.");
            return Self::default();
        };
        path.push(Self::FILENAME);
        match std::fs::read_to_string(&path) {
            Ok(string) => match toml::from_str(&string) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("Malformed {}, defaulting: {e}", path.display());
                    Self::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // First run. Put the defaults on disk so there's a file to edit.
                let config = Self::default();
                if let Err(e) = config.save() {
                    log::debug!("Couldn't write default preferences: {e}");
                }
                config
            }
            Err(e) => {
                log::warn!("Couldn't read {}, defaulting: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let mut preferences =
            preferences_dir().ok_or_else(|| anyhow::anyhow!("No preferences dir found"))?;
        // Explicity do *not* create recursively. If not found, the user probably has a good reason.
        // Ignore errors (could already exist). Any real errors will be emitted by file access below.
        let _ = std::fs::DirBuilder::new().create(&preferences);

        preferences.push(Self::FILENAME);
        let string = DOCUMENTATION.to_owned() + &toml::ser::to_string_pretty(self)?;
        std::fs::write(preferences, string)?;
        Ok(())
    }
}
