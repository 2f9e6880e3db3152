use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{AppError, AppResult, ConfigError, FileError};
use crate::models::{CaseType, SelectionLevel};

/// CSS selectors for the portal's controls
///
/// Point-in-time values; every one can be overridden from the config file.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PortalLocators {
    pub cause_list_menu: String,
    pub popup_close: String,
    pub state_select: String,
    pub district_select: String,
    pub court_complex_select: String,
    pub court_select: String,
    pub date_input: String,
    pub captcha_image: String,
    pub captcha_input: String,
    pub captcha_refresh: String,
    pub criminal_submit: String,
    pub civil_submit: String,
    /// Case search page fields
    pub cnr_input: String,
    pub case_type_input: String,
    pub case_number_input: String,
    pub case_year_input: String,
    pub search_button: String,
}

impl Default for PortalLocators {
    fn default() -> Self {
        Self {
            cause_list_menu: "#leftPaneMenuCL".to_string(),
            popup_close: "button.btn-close".to_string(),
            state_select: "#sess_state_code".to_string(),
            district_select: "#sess_dist_code".to_string(),
            court_complex_select: "#court_complex_code".to_string(),
            court_select: "#CL_court_no".to_string(),
            date_input: "#causelist_date".to_string(),
            captcha_image: "#captcha_image".to_string(),
            captcha_input: "#cause_list_captcha_code".to_string(),
            captcha_refresh: ".refresh-btn".to_string(),
            criminal_submit: r#"button[onclick="submit_causelist('cri')"]"#.to_string(),
            civil_submit: r#"button[onclick="submit_causelist('civ')"]"#.to_string(),
            cnr_input: "input[id*='cnr' i], input[placeholder*='cnr' i]".to_string(),
            case_type_input: "input[placeholder*='Case Type'], input[id*='caseType']".to_string(),
            case_number_input: "input[placeholder*='Case No'], input[id*='caseNo']".to_string(),
            case_year_input: "input[placeholder*='Year'], input[id*='caseYear']".to_string(),
            search_button: "button[type='submit']".to_string(),
        }
    }
}

impl PortalLocators {
    pub fn select_for(&self, level: SelectionLevel) -> &str {
        match level {
            SelectionLevel::State => &self.state_select,
            SelectionLevel::District => &self.district_select,
            SelectionLevel::CourtComplex => &self.court_complex_select,
            SelectionLevel::Court => &self.court_select,
        }
    }

    pub fn submit_for(&self, case_type: CaseType) -> &str {
        match case_type {
            CaseType::Criminal => &self.criminal_submit,
            CaseType::Civil => &self.civil_submit,
        }
    }
}

/// Program configuration
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Portal landing page
    pub home_url: String,
    /// Run the browser without a window
    pub headless: bool,
    /// Attach to an already running browser on this debug port instead of launching one
    pub browser_debug_port: Option<u16>,
    /// Explicit Chrome/Chromium executable
    pub chrome_executable: Option<String>,
    pub window_width: u32,
    pub window_height: u32,
    pub locators: PortalLocators,
    /// Upper bound for each cascading-control repopulation wait
    pub cascade_timeout_ms: u64,
    /// Upper bound for the results wait after each submit
    pub submit_timeout_ms: u64,
    /// Upper bound for optional page chrome (popups)
    pub popup_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub max_captcha_attempts: u32,
    /// Leading header rows of the results table
    pub header_rows: usize,
    /// Page text fragments that mean the captcha was rejected
    pub invalid_captcha_markers: Vec<String>,
    pub tesseract_binary: String,
    pub tesseract_args: Vec<String>,
    /// Directory for JSON reports and downloads
    pub output_dir: String,
    /// Queries (each with its own browser session) running at once in batch mode
    pub max_concurrent_queries: usize,
    pub download_pdfs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            home_url: "https://services.ecourts.gov.in/ecourtindia_v6/".to_string(),
            headless: true,
            browser_debug_port: None,
            chrome_executable: None,
            window_width: 1200,
            window_height: 900,
            locators: PortalLocators::default(),
            cascade_timeout_ms: 10_000,
            submit_timeout_ms: 8_000,
            popup_timeout_ms: 5_000,
            poll_interval_ms: 250,
            max_captcha_attempts: 5,
            header_rows: 2,
            invalid_captcha_markers: vec!["Invalid Captcha".to_string()],
            tesseract_binary: "tesseract".to_string(),
            tesseract_args: vec!["--psm".to_string(), "7".to_string()],
            output_dir: "outputs".to_string(),
            max_concurrent_queries: 1,
            download_pdfs: false,
        }
    }
}

impl Config {
    /// Defaults overridden by environment variables
    pub fn from_env() -> AppResult<Self> {
        Self::default().apply_env()
    }

    /// TOML file (missing keys take defaults), then environment overrides
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(&display, e))?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            AppError::File(FileError::TomlParseFailed {
                path: display,
                source: e,
            })
        })?;
        config.apply_env()
    }

    fn apply_env(mut self) -> AppResult<Self> {
        if let Ok(url) = std::env::var("ECOURTS_HOME_URL") {
            self.home_url = url;
        }
        if let Some(headless) = env_parse::<bool>("ECOURTS_HEADLESS", "bool")? {
            self.headless = headless;
        }
        if let Some(port) = env_parse::<u16>("BROWSER_DEBUG_PORT", "u16")? {
            self.browser_debug_port = Some(port);
        }
        if let Ok(path) = std::env::var("CHROME_EXECUTABLE") {
            self.chrome_executable = Some(path);
        }
        if let Some(attempts) = env_parse::<u32>("MAX_CAPTCHA_ATTEMPTS", "u32")? {
            self.max_captcha_attempts = attempts;
        }
        if let Some(rows) = env_parse::<usize>("HEADER_ROWS", "usize")? {
            self.header_rows = rows;
        }
        if let Ok(binary) = std::env::var("TESSERACT_BINARY") {
            self.tesseract_binary = binary;
        }
        if let Ok(dir) = std::env::var("OUTPUT_DIR") {
            self.output_dir = dir;
        }
        if let Some(n) = env_parse::<usize>("MAX_CONCURRENT_QUERIES", "usize")? {
            self.max_concurrent_queries = n;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.max_captcha_attempts == 0 {
            return Err(invalid("max_captcha_attempts", "must be at least 1"));
        }
        if self.max_concurrent_queries == 0 {
            return Err(invalid("max_concurrent_queries", "must be at least 1"));
        }
        if self.poll_interval_ms == 0 {
            return Err(invalid("poll_interval_ms", "must be greater than 0"));
        }
        Ok(())
    }

    pub fn cascade_timeout(&self) -> Duration {
        Duration::from_millis(self.cascade_timeout_ms)
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_millis(self.submit_timeout_ms)
    }

    pub fn popup_timeout(&self) -> Duration {
        Duration::from_millis(self.popup_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn invalid(name: &str, reason: &str) -> AppError {
    AppError::Config(ConfigError::InvalidValue {
        name: name.to_string(),
        reason: reason.to_string(),
    })
}

fn env_parse<T: std::str::FromStr>(var_name: &str, expected_type: &str) -> AppResult<Option<T>> {
    match std::env::var(var_name) {
        Ok(value) => value.trim().parse::<T>().map(Some).map_err(|_| {
            AppError::Config(ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            })
        }),
        Err(_) => Ok(None),
    }
}
