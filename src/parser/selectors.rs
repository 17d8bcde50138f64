//! CSS selectors for the scheduling portal's pages
//!
//! The portal is a Rails application: every rendered page carries a CSRF meta
//! tag, and the sign-in and booking pages are plain HTML forms.

use lazy_static::lazy_static;
use scraper::Selector;

// Helper macro to parse selectors safely at compile time
macro_rules! parse_selector {
    ($s:expr) => {
        Selector::parse($s).expect(concat!("Invalid CSS selector: ", $s))
    };
}

/// `select` holding the consulate facilities on the booking form
pub const CONSULATE_FACILITY_SELECT: &str = "#appointments_consulate_appointment_facility_id";

/// `select` holding the ASC facilities on the booking form
pub const ASC_FACILITY_SELECT: &str = "#appointments_asc_appointment_facility_id";

lazy_static! {
    static ref CSRF_META: Selector = parse_selector!("meta[name='csrf-token']");

    static ref OPTION: Selector = parse_selector!("option");

    static ref SIGN_IN_FORM: Vec<Selector> = vec![
        parse_selector!("form#sign_in_form"),
        parse_selector!("form[action$='/users/sign_in']"),
        parse_selector!("input[name='user[email]']"),
    ];

    static ref FLASH_MESSAGES: Vec<Selector> = vec![
        parse_selector!("#flash_messages .error"),
        parse_selector!("#flash_messages p"),
        parse_selector!(".alert"),
        parse_selector!("div.error"),
        parse_selector!(".errorExplanation li"),
    ];
}

/// Selectors for the portal's pages
pub struct PortalSelectors {
    pub csrf_meta: &'static Selector,
    pub option: &'static Selector,
    pub sign_in_form: &'static [Selector],
    pub flash_messages: &'static [Selector],
}

impl PortalSelectors {
    pub fn new() -> Self {
        Self {
            csrf_meta: &CSRF_META,
            option: &OPTION,
            sign_in_form: &SIGN_IN_FORM,
            flash_messages: &FLASH_MESSAGES,
        }
    }
}

impl Default for PortalSelectors {
    fn default() -> Self {
        Self::new()
    }
}
