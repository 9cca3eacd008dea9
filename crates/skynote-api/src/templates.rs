//! HTML views. Askama escapes every interpolated value.

use askama::Template;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate<'a> {
    pub notes: &'a [String],
}

#[derive(Template)]
#[template(path = "view.html")]
pub struct ViewTemplate<'a> {
    pub title: &'a str,
    pub body: &'a str,
}

#[derive(Template)]
#[template(path = "edit.html")]
pub struct EditTemplate<'a> {
    pub title: &'a str,
    pub body: &'a str,
}
