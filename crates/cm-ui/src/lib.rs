//! # cm-ui
//!
//! Askama page templates. Every page extends `base.html`, which needs
//! `current_user` to draw the navigation bar.

use askama::Template;
use cm_core::{Car, CarInput, Comment, FieldErrors};

#[derive(Template)]
#[template(path = "car_list.html")]
pub struct CarListTemplate<'a> {
    pub current_user: Option<&'a str>,
    pub cars: &'a [Car],
}

#[derive(Template)]
#[template(path = "car_detail.html")]
pub struct CarDetailTemplate<'a> {
    pub current_user: Option<&'a str>,
    pub car: &'a Car,
    pub comments: &'a [Comment],
    /// Only the owner sees the edit/delete links
    pub can_edit: bool,
}

/// Raw values echoed back into the car form.
#[derive(Debug, Default, Clone)]
pub struct CarFormValues {
    pub make: String,
    pub model: String,
    pub year: String,
    pub description: String,
}

impl From<&CarInput> for CarFormValues {
    fn from(input: &CarInput) -> Self {
        Self {
            make: input.make.clone(),
            model: input.model.clone(),
            year: input.year.to_string(),
            description: input.description.clone(),
        }
    }
}

#[derive(Template)]
#[template(path = "car_form.html")]
pub struct CarFormTemplate<'a> {
    pub current_user: Option<&'a str>,
    pub heading: &'a str,
    pub action: &'a str,
    pub values: CarFormValues,
    pub errors: &'a FieldErrors,
}

#[derive(Template)]
#[template(path = "car_confirm_delete.html")]
pub struct CarConfirmDeleteTemplate<'a> {
    pub current_user: Option<&'a str>,
    pub car: &'a Car,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate<'a> {
    pub current_user: Option<&'a str>,
    pub username: &'a str,
    pub email: &'a str,
    pub errors: &'a FieldErrors,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate<'a> {
    pub current_user: Option<&'a str>,
    pub username: &'a str,
    pub next: &'a str,
    pub errors: &'a FieldErrors,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate<'a> {
    pub current_user: Option<&'a str>,
    pub status: u16,
    pub message: &'a str,
}

/// Escapes HTML, then turns newlines into `<br />`. Output is safe to embed.
pub fn linebreaks(raw: &str) -> String {
    html_escape::encode_text(raw)
        .lines()
        .collect::<Vec<_>>()
        .join("<br />")
}

mod filters {
    pub fn linebreaks<T: std::fmt::Display>(s: T) -> ::askama::Result<String> {
        Ok(super::linebreaks(&s.to_string()))
    }
}
