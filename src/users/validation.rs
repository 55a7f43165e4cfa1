use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref LATIN_DIGITS_RE: Regex = Regex::new(r"^[a-zA-Z0-9]+$").unwrap();
    static ref NAME_RE: Regex = Regex::new(r"^[a-zA-Zа-яА-ЯёЁ]+$").unwrap();
}

pub(crate) fn is_valid_login(login: &str) -> bool {
    LATIN_DIGITS_RE.is_match(login)
}

pub(crate) fn is_valid_password(password: &str) -> bool {
    LATIN_DIGITS_RE.is_match(password)
}

/// Latin or Cyrillic letters only.
pub(crate) fn is_valid_name(name: &str) -> bool {
    NAME_RE.is_match(name)
}
