//! Default catalogue for a fresh agency database.

use crate::models::{CaseStudy, ServiceData, Testimonial, now_rfc3339};
use crate::services::slug::slugify;
use crate::storage::StorageManager;
use color_eyre::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub services_added: usize,
    pub case_studies_added: usize,
    /// Records left alone because their slug already exists
    pub skipped: usize,
}

impl SeedReport {
    #[must_use]
    pub fn added(&self) -> usize {
        self.services_added + self.case_studies_added
    }
}

fn service(title: &str, description: &str, features: &[&str], price_from: f64) -> ServiceData {
    ServiceData {
        slug: slugify(title),
        title: title.to_string(),
        description: description.to_string(),
        features: features.iter().map(|feature| (*feature).to_string()).collect(),
        price_from: Some(price_from),
        ..ServiceData::default()
    }
}

#[must_use]
pub fn default_services() -> Vec<ServiceData> {
    vec![
        service(
            "Strony internetowe",
            "Szybkie, responsywne strony firmowe z CMS.",
            &["Projekt UX/UI", "Wdrożenie CMS", "Optymalizacja SEO", "Hosting i opieka"],
            4900.0,
        ),
        service(
            "Sklepy internetowe",
            "Sklepy e-commerce zintegrowane z płatnościami i logistyką.",
            &["Integracja płatności", "Integracja kurierów", "Panel zamówień", "Analityka sprzedaży"],
            12900.0,
        ),
        service(
            "Aplikacje mobilne",
            "Aplikacje na iOS i Androida od makiety do publikacji.",
            &["Makiety i prototyp", "Aplikacja cross-platform", "Publikacja w sklepach"],
            29900.0,
        ),
        service(
            "Kampanie Google Ads",
            "Kampanie płatne nastawione na konwersje.",
            &["Audyt konta", "Kampanie Search i PMax", "Raport miesięczny"],
            1500.0,
        ),
        service(
            "Social media",
            "Prowadzenie profili i kampanie Meta Ads.",
            &["Strategia treści", "Grafiki i copy", "Kampanie Meta Ads"],
            2000.0,
        ),
        service(
            "Branding",
            "Identyfikacja wizualna od logo po księgę znaku.",
            &["Logo", "Księga znaku", "Materiały firmowe"],
            6500.0,
        ),
    ]
}

#[must_use]
pub fn default_case_studies() -> Vec<CaseStudy> {
    let created_at = now_rfc3339();
    vec![
        CaseStudy {
            slug: slugify("Sklep internetowy dla piekarni"),
            title: "Sklep internetowy dla piekarni".to_string(),
            client: "Łódzka Piekarnia Rzemieślnicza".to_string(),
            category: "E-commerce".to_string(),
            challenge: "Sprzedaż ograniczona do jednego punktu stacjonarnego.".to_string(),
            solution: "Sklep z zamówieniami na wybrany dzień odbioru i dostawą lokalną.".to_string(),
            results: vec![
                "+35% przychodu w pół roku".to_string(),
                "40% zamówień składanych online".to_string(),
            ],
            testimonial: Some(Testimonial {
                quote: "Klienci zamawiają chleb wieczorem i odbierają rano.".to_string(),
                author: "Marta Zielińska".to_string(),
                role: "Właścicielka".to_string(),
            }),
            created_at: created_at.clone(),
            ..CaseStudy::default()
        },
        CaseStudy {
            slug: slugify("Aplikacja mobilna dla klubu fitness"),
            title: "Aplikacja mobilna dla klubu fitness".to_string(),
            client: "FitZone".to_string(),
            category: "Aplikacje mobilne".to_string(),
            challenge: "Zapisy na zajęcia przez telefon i przepełnione grupy.".to_string(),
            solution: "Aplikacja z rezerwacjami, listą rezerwową i przypomnieniami.".to_string(),
            results: vec!["-60% nieobecności na zajęciach".to_string()],
            created_at: created_at.clone(),
            ..CaseStudy::default()
        },
        CaseStudy {
            slug: slugify("Kampania Google Ads dla biura rachunkowego"),
            title: "Kampania Google Ads dla biura rachunkowego".to_string(),
            client: "Biuro Rachunkowe Bilans".to_string(),
            category: "Marketing".to_string(),
            challenge: "Brak zapytań od nowych firm spoza polecenia.".to_string(),
            solution: "Kampania Search na frazy lokalne i landing page z formularzem.".to_string(),
            results: vec!["32 nowe zapytania miesięcznie".to_string(), "CPA 48 PLN".to_string()],
            created_at,
            ..CaseStudy::default()
        },
    ]
}

/// Inserts the default services and case studies, skipping any slug that
/// is already present. Running it twice adds nothing the second time.
pub async fn seed_defaults(storage: &StorageManager) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    for service in default_services() {
        if storage.get_service_by_slug(&service.slug).await?.is_some() {
            report.skipped += 1;
            continue;
        }
        storage.add_service(service).await?;
        report.services_added += 1;
    }

    for case_study in default_case_studies() {
        if storage.get_case_study_by_slug(&case_study.slug).await?.is_some() {
            report.skipped += 1;
            continue;
        }
        storage.add_case_study(case_study).await?;
        report.case_studies_added += 1;
    }

    tracing::info!(
        services = report.services_added,
        case_studies = report.case_studies_added,
        skipped = report.skipped,
        "seeded defaults"
    );
    Ok(report)
}
