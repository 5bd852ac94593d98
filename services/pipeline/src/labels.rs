//! Localized UI labels
//!
//! An immutable label table built once at startup and passed explicitly to
//! whatever needs localized text, with no ambient global dictionary. The
//! language code doubles as the locale segment of upstream API URLs.

use std::collections::HashMap;

use serde::Serialize;

/// Dashboard languages supported by the upstream API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    Et,
    En,
}

impl Lang {
    pub fn as_str(self) -> &'static str {
        match self {
            Lang::Et => "et",
            Lang::En => "en",
        }
    }

    pub fn parse(code: &str) -> Option<Lang> {
        match code {
            "et" => Some(Lang::Et),
            "en" => Some(Lang::En),
            _ => None,
        }
    }
}

/// Immutable language → key → text table.
#[derive(Debug, Clone)]
pub struct Labels {
    table: HashMap<Lang, HashMap<&'static str, &'static str>>,
}

impl Labels {
    /// The dashboard's built-in Estonian/English label set.
    pub fn builtin() -> Self {
        let et: HashMap<&'static str, &'static str> = [
            ("all.indicators", "Kõik indikaatorid"),
            ("all.sectors", "Kõik tegevusalad"),
            ("all.periods", "Kogu periood"),
            ("indicator.label", "Indikaator"),
            ("sector.label", "Tegevusala"),
            ("year.label", "Aasta"),
            ("language.label", "Vali keel"),
            ("salary.header", "Brutokuupalk – PA103"),
            ("salary.title", "Keskmine brutokuupalk aasta kaupa"),
            ("salary.label", "Brutokuupalk €"),
            ("salary.change", "Palgamuutus %"),
            ("salary.average", "Keskmine palk"),
            ("salary.median", "Mediaanpalk"),
            ("salary.difference", "Keskmise ja mediaani erinevus"),
            ("salary.comparison.title", "Keskmine vs mediaanpalk tegevusalade kaupa"),
            ("salary.short.header", "Keskmine brutokuupalk maakonniti – PA117"),
            ("salary.notice", "Allikas: Statistikaamet"),
        ]
        .into_iter()
        .collect();

        let en: HashMap<&'static str, &'static str> = [
            ("all.indicators", "All indicators"),
            ("all.sectors", "All sectors"),
            ("all.periods", "Entire period"),
            ("indicator.label", "Indicator"),
            ("sector.label", "Sector"),
            ("year.label", "Year"),
            ("language.label", "Select language"),
            ("salary.header", "Gross salary – PA103"),
            ("salary.title", "Average gross monthly salary across years"),
            ("salary.label", "Gross salary €"),
            ("salary.change", "Salary change %"),
            ("salary.average", "Average salary"),
            ("salary.median", "Median salary"),
            ("salary.difference", "Average vs median difference"),
            ("salary.comparison.title", "Average vs median salary by sector"),
            ("salary.short.header", "Average gross monthly salary by county – PA117"),
            ("salary.notice", "Source: Statistics Estonia"),
        ]
        .into_iter()
        .collect();

        Labels {
            table: [(Lang::Et, et), (Lang::En, en)].into_iter().collect(),
        }
    }

    /// Look up a label. Missing keys fall back to the key itself so a gap
    /// in the table shows up on screen instead of panicking.
    pub fn get<'a>(&'a self, lang: Lang, key: &'a str) -> &'a str {
        self.table
            .get(&lang)
            .and_then(|t| t.get(key))
            .copied()
            .unwrap_or(key)
    }
}
