//! In-memory portal and recognizer used by the integration tests

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;

use ecourts_causelist::error::{AppResult, OcrError};
use ecourts_causelist::{
    Config, ControlState, PortalDriver, PortalLocators, SelectOption, SelectionLevel,
    TextRecognizer,
};

pub const FORM_PAGE: &str = r#"
<html><body>
  <form>
    <label for="cause_list_captcha_code">Enter Captcha</label>
    <input id="cause_list_captcha_code">
  </form>
</body></html>
"#;

pub const INVALID_CAPTCHA_PAGE: &str = r#"
<html><body>
  <div class="alert alert-danger">Invalid Captcha</div>
  <form><input id="cause_list_captcha_code"></form>
</body></html>
"#;

pub const RESULTS_PAGE: &str = r#"
<html><body>
  <div id="res_cause_list">
    <table>
      <tr><th colspan="4">9-Indrani Gupta-CJM</th></tr>
      <tr><th>Sr No</th><th>Cases</th><th>Party Name</th><th>Advocate</th></tr>
      <tr><td>1</td><td>View<br>CC/1203/2024</td><td>State<br>Vs<br>Ramesh Kumar</td><td>A. Sharma</td></tr>
      <tr><td>2</td><td>GR/77/2023</td><td>Sunita Devi Vs Mohan Lal</td><td>B. Verma 22-10-2025</td></tr>
      <tr><td>3</td><td>CC/15/2025</td><td>State Vs Unknown</td><td>C. Das</td></tr>
    </table>
    <a href="/ecourtindia_v6/cases/causelist_21102025.pdf">Download</a>
  </div>
</body></html>
"#;

/// Navigation table some portal pages carry around the form
pub const LAYOUT_TABLE: &str =
    "<table><tr><td>Court Establishment</td></tr><tr><td>Cause List</td></tr></table>";

/// Config with short waits so retries run fast
pub fn test_config() -> Config {
    Config {
        home_url: "https://portal.test/ecourtindia_v6/".to_string(),
        cascade_timeout_ms: 200,
        submit_timeout_ms: 30,
        popup_timeout_ms: 20,
        poll_interval_ms: 1,
        ..Config::default()
    }
}

struct FakeState {
    /// state → district → complex → courts
    tree: BTreeMap<String, BTreeMap<String, BTreeMap<String, Vec<String>>>>,
    selected: [Option<String>; 4],
    menu_opened: bool,
    popup_visible: bool,
    current_page: String,
    /// Page shown after each submit click, in order; the form page once exhausted
    submit_pages: VecDeque<String>,
    clicks: Vec<String>,
    values: HashMap<String, String>,
    screenshots: u32,
    navigations: u32,
    closed: bool,
    layout_table: bool,
    captcha_version: u32,
    /// Polls of the image `src` that still see the old challenge after a refresh
    captcha_stale_polls: u32,
    captcha_stale_left: Option<u32>,
    stale_screenshots: u32,
}

/// Mimics the cascading form: each level's options depend on the level below
pub struct FakePortal {
    locators: PortalLocators,
    state: Mutex<FakeState>,
}

impl FakePortal {
    pub fn new() -> Self {
        let mut tree = BTreeMap::new();

        let mut asansol = BTreeMap::new();
        asansol.insert(
            "ASANSOL COURT COMPLEX".to_string(),
            vec!["9-Indrani Gupta-CJM".to_string(), "2-Civil Judge".to_string()],
        );
        asansol.insert("DURGAPUR COURT".to_string(), vec!["1-ACJM".to_string()]);
        let mut wb = BTreeMap::new();
        wb.insert("Paschim Bardhaman".to_string(), asansol);
        let mut kolkata = BTreeMap::new();
        kolkata.insert("CITY CIVIL COURT".to_string(), vec!["1-Judge".to_string()]);
        wb.insert("Kolkata".to_string(), kolkata);
        tree.insert("West Bengal".to_string(), wb);

        let mut pune = BTreeMap::new();
        pune.insert("PUNE DISTRICT COURT".to_string(), vec!["1-Civil Judge".to_string()]);
        let mut mh = BTreeMap::new();
        mh.insert("Pune".to_string(), pune);
        tree.insert("Maharashtra".to_string(), mh);

        Self {
            locators: PortalLocators::default(),
            state: Mutex::new(FakeState {
                tree,
                selected: Default::default(),
                menu_opened: false,
                popup_visible: false,
                current_page: String::new(),
                submit_pages: VecDeque::new(),
                clicks: Vec::new(),
                values: HashMap::new(),
                screenshots: 0,
                navigations: 0,
                closed: false,
                layout_table: false,
                captcha_version: 1,
                captcha_stale_polls: 0,
                captcha_stale_left: None,
                stale_screenshots: 0,
            }),
        }
    }

    pub fn with_popup(self) -> Self {
        self.state.lock().unwrap().popup_visible = true;
        self
    }

    pub fn with_submit_pages(self, pages: &[&str]) -> Self {
        self.state.lock().unwrap().submit_pages = pages.iter().map(|p| p.to_string()).collect();
        self
    }

    /// Every page also shows a two-row layout table
    pub fn with_layout_table(self) -> Self {
        self.state.lock().unwrap().layout_table = true;
        self
    }

    /// After a refresh, the image `src` keeps its old value for `polls` reads
    pub fn with_slow_captcha_refresh(self, polls: u32) -> Self {
        self.state.lock().unwrap().captcha_stale_polls = polls;
        self
    }

    pub fn captcha_version(&self) -> u32 {
        self.state.lock().unwrap().captcha_version
    }

    /// Screenshots taken while the refreshed image had not loaded yet
    pub fn stale_screenshots(&self) -> u32 {
        self.state.lock().unwrap().stale_screenshots
    }

    pub fn clicks(&self) -> Vec<String> {
        self.state.lock().unwrap().clicks.clone()
    }

    pub fn click_count(&self, locator: &str) -> usize {
        self.clicks().iter().filter(|c| *c == locator).count()
    }

    pub fn value_of(&self, locator: &str) -> Option<String> {
        self.state.lock().unwrap().values.get(locator).cloned()
    }

    pub fn selected(&self, level: SelectionLevel) -> Option<String> {
        self.state.lock().unwrap().selected[level.index()].clone()
    }

    pub fn screenshots(&self) -> u32 {
        self.state.lock().unwrap().screenshots
    }

    pub fn navigations(&self) -> u32 {
        self.state.lock().unwrap().navigations
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    pub fn popup_visible(&self) -> bool {
        self.state.lock().unwrap().popup_visible
    }

    fn level_of(&self, locator: &str) -> Option<SelectionLevel> {
        SelectionLevel::ALL
            .into_iter()
            .find(|level| self.locators.select_for(*level) == locator)
    }
}

impl FakeState {
    /// Option texts of `level` given the current lower selections
    fn option_texts(&self, level: SelectionLevel) -> Option<Vec<String>> {
        let [state, district, complex, _] = &self.selected;
        let texts = match level {
            SelectionLevel::State => self.tree.keys().cloned().collect(),
            SelectionLevel::District => self.tree.get(state.as_ref()?)?.keys().cloned().collect(),
            SelectionLevel::CourtComplex => self
                .tree
                .get(state.as_ref()?)?
                .get(district.as_ref()?)?
                .keys()
                .cloned()
                .collect(),
            SelectionLevel::Court => self
                .tree
                .get(state.as_ref()?)?
                .get(district.as_ref()?)?
                .get(complex.as_ref()?)?
                .clone(),
        };
        Some(texts)
    }
}

impl PortalDriver for FakePortal {
    async fn navigate(&self, _url: &str) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        state.navigations += 1;
        state.menu_opened = false;
        state.selected = Default::default();
        state.current_page = FORM_PAGE.to_string();
        Ok(())
    }

    async fn control_state(&self, locator: &str) -> AppResult<ControlState> {
        let state = self.state.lock().unwrap();
        if let Some(level) = self.level_of(locator) {
            let options = state.option_texts(level);
            return Ok(ControlState {
                present: state.menu_opened,
                enabled: options.is_some(),
                option_count: options.map_or(1, |o| o.len() + 1),
            });
        }

        let search_fields = [
            &self.locators.cnr_input,
            &self.locators.case_type_input,
            &self.locators.case_number_input,
            &self.locators.case_year_input,
        ];
        let present = if locator == self.locators.cause_list_menu
            || search_fields.iter().any(|field| *field == locator)
        {
            state.navigations > 0
        } else if locator == self.locators.popup_close {
            state.menu_opened && state.popup_visible
        } else {
            state.menu_opened
        };
        Ok(ControlState {
            present,
            enabled: present,
            option_count: 0,
        })
    }

    async fn options(&self, locator: &str) -> AppResult<Vec<SelectOption>> {
        let state = self.state.lock().unwrap();
        let mut options = vec![SelectOption::new("Select", "0")];
        if let Some(level) = self.level_of(locator) {
            if let Some(texts) = state.option_texts(level) {
                options.extend(
                    texts
                        .into_iter()
                        .enumerate()
                        .map(|(i, text)| SelectOption::new(text, (i + 1).to_string())),
                );
            }
        }
        Ok(options)
    }

    async fn select_option(&self, locator: &str, visible_text: &str) -> AppResult<bool> {
        let mut state = self.state.lock().unwrap();
        let Some(level) = self.level_of(locator) else {
            return Ok(false);
        };
        let known = state
            .option_texts(level)
            .is_some_and(|texts| texts.iter().any(|t| t == visible_text));
        if !known {
            return Ok(false);
        }
        state.selected[level.index()] = Some(visible_text.to_string());
        for higher in &mut state.selected[level.index() + 1..] {
            *higher = None;
        }
        Ok(true)
    }

    async fn set_value(&self, locator: &str, value: &str) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        state.values.insert(locator.to_string(), value.to_string());
        Ok(())
    }

    async fn attribute(&self, locator: &str, name: &str) -> AppResult<Option<String>> {
        let mut state = self.state.lock().unwrap();
        if locator != self.locators.captcha_image || name != "src" || !state.menu_opened {
            return Ok(None);
        }
        match state.captcha_stale_left {
            Some(0) => {
                state.captcha_version += 1;
                state.captcha_stale_left = None;
            }
            Some(left) => state.captcha_stale_left = Some(left - 1),
            None => {}
        }
        Ok(Some(format!(
            "/ecourtindia_v6/vendor/securimage/securimage_show.php?{}",
            state.captcha_version
        )))
    }

    async fn click(&self, locator: &str) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        state.clicks.push(locator.to_string());

        if locator == self.locators.captcha_refresh {
            state.captcha_stale_left = Some(state.captcha_stale_polls);
        } else if locator == self.locators.cause_list_menu {
            state.menu_opened = true;
        } else if locator == self.locators.popup_close {
            state.popup_visible = false;
        } else if locator == self.locators.criminal_submit
            || locator == self.locators.civil_submit
            || locator == self.locators.search_button
        {
            let next = state
                .submit_pages
                .pop_front()
                .unwrap_or_else(|| FORM_PAGE.to_string());
            state.current_page = next;
        }
        Ok(())
    }

    async fn screenshot(&self, _locator: &str) -> AppResult<Vec<u8>> {
        let mut state = self.state.lock().unwrap();
        state.screenshots += 1;
        if state.captcha_stale_left.is_some() {
            state.stale_screenshots += 1;
        }
        Ok(vec![0x89, b'P', b'N', b'G', state.screenshots as u8])
    }

    async fn content(&self) -> AppResult<String> {
        let state = self.state.lock().unwrap();
        if state.layout_table {
            return Ok(state
                .current_page
                .replacen("<body>", &format!("<body>{}", LAYOUT_TABLE), 1));
        }
        Ok(state.current_page.clone())
    }

    async fn close(&mut self) -> AppResult<()> {
        self.state.lock().unwrap().closed = true;
        Ok(())
    }
}

/// Returns canned answers in order, then empty strings
pub struct ScriptedRecognizer {
    answers: Mutex<VecDeque<String>>,
    calls: Mutex<u32>,
}

impl ScriptedRecognizer {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

impl TextRecognizer for ScriptedRecognizer {
    async fn recognize(&self, _image: &[u8]) -> AppResult<String> {
        *self.calls.lock().unwrap() += 1;
        Ok(self.answers.lock().unwrap().pop_front().unwrap_or_default())
    }
}

impl TextRecognizer for &ScriptedRecognizer {
    async fn recognize(&self, image: &[u8]) -> AppResult<String> {
        (**self).recognize(image).await
    }
}

/// Recognizer whose engine is missing
pub struct BrokenRecognizer;

impl TextRecognizer for BrokenRecognizer {
    async fn recognize(&self, _image: &[u8]) -> AppResult<String> {
        Err(OcrError::EngineUnavailable {
            binary: "tesseract".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not installed"),
        }
        .into())
    }
}
