use std::env::var_os;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Duration;
use eyre::WrapErr;
use serde::{Serialize, Deserialize};
use charlcd_gpio::lcd::hd44780::{CursorDirection, DisplayGeometry, InterfaceWidth, LcdConfig, Timing};

const DEFAULT_CONFIG_FILE: &str = "charlcd.json";

#[derive(Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct Config {
    pub geometry: DisplayGeometry,
    pub interface: InterfaceWidth,
    /// First port bit of DB4..DB7 in 4-bit mode.
    pub data_shift: u8,
    pub cursor_direction: CursorDirection,
    pub display_shift: bool,
    pub cursor: bool,
    pub blink: bool,
    pub big_font: bool,
    pub busy_timeout_ms: Option<u64>,
}

impl Config {
    fn path() -> PathBuf {
        var_os("CONFIG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Loads the config file. `Ok(None)` means there is no file yet, a file that can't be read or
    /// parsed is an error.
    pub fn try_load() -> eyre::Result<Option<Self>> {
        Self::load_from(&Self::path())
    }

    pub fn save(&self) -> eyre::Result<()> {
        self.save_to(&Self::path())
    }

    fn load_from(path: &Path) -> eyre::Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let file = File::open(path).wrap_err_with(|| format!("Failed to open {}", path.display()))?;
        let reader = BufReader::new(file);
        let config = serde_json::from_reader(reader)
            .wrap_err_with(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(config))
    }

    fn save_to(&self, path: &Path) -> eyre::Result<()> {
        let file = File::create(path).wrap_err_with(|| format!("Failed to create {}", path.display()))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn lcd_config(&self) -> LcdConfig {
        LcdConfig {
            cursor_direction: self.cursor_direction,
            display_shift: self.display_shift,
            display_on: true,
            cursor_on: self.cursor,
            blink_on: self.blink,
            big_font: self.big_font,
            timing: Timing {
                busy_timeout: self.busy_timeout_ms.map(Duration::from_millis),
                ..Timing::default()
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            geometry: DisplayGeometry::Lcd20x4,
            interface: InterfaceWidth::FourBit,
            data_shift: 4,
            cursor_direction: CursorDirection::Right,
            display_shift: false,
            cursor: false,
            blink: false,
            big_font: false,
            busy_timeout_ms: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config: Config = serde_json::from_str(r#"{ "geometry": "16x2", "interface": "eight_bit" }"#).unwrap();
        assert_eq!(config.geometry, DisplayGeometry::Lcd16x2);
        assert_eq!(config.interface, InterfaceWidth::EightBit);
        assert_eq!(config.data_shift, 4);
        assert_eq!(config.cursor_direction, CursorDirection::Right);
    }

    #[test]
    fn geometry_is_stored_as_text() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains(r#""geometry":"20x4""#));
        assert!(json.contains(r#""interface":"four_bit""#));
    }

    fn scratch_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("charlcd-{}-{}.json", std::process::id(), name))
    }

    #[test]
    fn missing_file_loads_nothing() {
        let path = scratch_file("missing");
        let _ = std::fs::remove_file(&path);
        assert!(Config::load_from(&path).unwrap().is_none());
    }

    #[test]
    fn malformed_file_is_an_error_and_kept() {
        let path = scratch_file("malformed");
        let contents = r#"{ "geometry": "21x4" }"#;
        std::fs::write(&path, contents).unwrap();

        assert!(Config::load_from(&path).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), contents);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn saved_config_loads_back() {
        let path = scratch_file("saved");
        let config = Config {
            geometry: DisplayGeometry::Lcd16x4,
            blink: true,
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap().unwrap();
        assert_eq!(loaded.geometry, DisplayGeometry::Lcd16x4);
        assert!(loaded.blink);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn busy_timeout_reaches_the_driver() {
        let config = Config {
            busy_timeout_ms: Some(20),
            ..Config::default()
        };
        assert_eq!(config.lcd_config().timing.busy_timeout, Some(Duration::from_millis(20)));
    }
}
