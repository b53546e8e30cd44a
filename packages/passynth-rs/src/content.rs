//! Plausible replacement text for the fields of a Russian internal passport.
//!
//! One [`PassportContent`] is drawn per generated image so that every field on the page tells
//! the same story: names agree with the gender, the issue date follows the birth date and the
//! series carries the issue year.
use chrono::{Datelike, Duration, Local, Months, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const DATE_FORMAT: &str = "%d.%m.%Y";

/// Passports are issued at 14 and replaced at 20 and 45.
const ISSUE_AGES: [u32; 3] = [45, 20, 14];
const MIN_AGE: u32 = 14;
const MAX_AGE: u32 = 79;

const MALE_SURNAMES: &[&str] = &[
    "ИВАНОВ", "СМИРНОВ", "КУЗНЕЦОВ", "ПОПОВ", "ВАСИЛЬЕВ", "ПЕТРОВ", "СОКОЛОВ", "МИХАЙЛОВ",
    "НОВИКОВ", "ФЁДОРОВ", "МОРОЗОВ", "ВОЛКОВ", "АЛЕКСЕЕВ", "ЛЕБЕДЕВ", "СЕМЁНОВ", "ЕГОРОВ",
    "ПАВЛОВ", "КОЗЛОВ", "СТЕПАНОВ", "НИКОЛАЕВ", "ОРЛОВ", "ЗАХАРОВ", "ЗАЙЦЕВ", "СОЛОВЬЁВ",
    "БОРИСОВ", "ЯКОВЛЕВ", "ГРИГОРЬЕВ", "РОМАНОВ", "ВОРОБЬЁВ", "КАЛИНИН", "ИЛЬИН", "ГОЛУБЕВ",
    "ВЫСОЦКИЙ", "ЗАВАДСКИЙ", "ШЕВЧЕНКО", "КОВАЛЬЧУК",
];

const MALE_NAMES: &[&str] = &[
    "АЛЕКСАНДР", "ДМИТРИЙ", "МАКСИМ", "СЕРГЕЙ", "АНДРЕЙ", "АЛЕКСЕЙ", "АРТЁМ", "ИЛЬЯ",
    "КИРИЛЛ", "МИХАИЛ", "НИКИТА", "ИВАН", "ЕВГЕНИЙ", "ВЛАДИМИР", "ПАВЕЛ", "НИКОЛАЙ",
    "РОМАН", "ОЛЕГ", "ЮРИЙ", "ВИКТОР",
];

const FEMALE_NAMES: &[&str] = &[
    "АННА", "МАРИЯ", "ЕЛЕНА", "ОЛЬГА", "ТАТЬЯНА", "НАТАЛЬЯ", "ЕКАТЕРИНА", "ИРИНА",
    "СВЕТЛАНА", "ЮЛИЯ", "АНАСТАСИЯ", "ДАРЬЯ", "ВИКТОРИЯ", "ПОЛИНА", "ЛЮДМИЛА", "ГАЛИНА",
    "КСЕНИЯ", "ВАЛЕНТИНА",
];

/// Patronymics as (masculine, feminine) pairs.
const PATRONYMICS: &[(&str, &str)] = &[
    ("АЛЕКСАНДРОВИЧ", "АЛЕКСАНДРОВНА"),
    ("ДМИТРИЕВИЧ", "ДМИТРИЕВНА"),
    ("СЕРГЕЕВИЧ", "СЕРГЕЕВНА"),
    ("АНДРЕЕВИЧ", "АНДРЕЕВНА"),
    ("АЛЕКСЕЕВИЧ", "АЛЕКСЕЕВНА"),
    ("МИХАЙЛОВИЧ", "МИХАЙЛОВНА"),
    ("ИВАНОВИЧ", "ИВАНОВНА"),
    ("ВЛАДИМИРОВИЧ", "ВЛАДИМИРОВНА"),
    ("НИКОЛАЕВИЧ", "НИКОЛАЕВНА"),
    ("ПАВЛОВИЧ", "ПАВЛОВНА"),
    ("ВИКТОРОВИЧ", "ВИКТОРОВНА"),
    ("ЮРЬЕВИЧ", "ЮРЬЕВНА"),
    ("ПЕТРОВИЧ", "ПЕТРОВНА"),
    ("ОЛЕГОВИЧ", "ОЛЕГОВНА"),
];

struct Region {
    /// First two digits of the passport series.
    okato: &'static str,
    /// First two digits of the department code.
    subdivision: &'static str,
    places: &'static [&'static str],
    authorities: &'static [&'static str],
}

const REGIONS: &[Region] = &[
    Region {
        okato: "45",
        subdivision: "77",
        places: &["ГОР. МОСКВА"],
        authorities: &[
            "ОТДЕЛЕНИЕМ УФМС РОССИИ ПО ГОР. МОСКВЕ ПО РАЙОНУ АРБАТ",
            "ОТДЕЛОМ УФМС РОССИИ ПО ГОР. МОСКВЕ ПО РАЙОНУ ХАМОВНИКИ",
            "ГУ МВД РОССИИ ПО Г. МОСКВЕ",
        ],
    },
    Region {
        okato: "40",
        subdivision: "78",
        places: &["ГОР. ЛЕНИНГРАД", "ГОР. САНКТ-ПЕТЕРБУРГ"],
        authorities: &[
            "ТП № 12 ОТДЕЛА УФМС РОССИИ ПО САНКТ-ПЕТЕРБУРГУ И ЛЕНИНГРАДСКОЙ ОБЛ. В ЦЕНТРАЛЬНОМ Р-НЕ",
            "ГУ МВД РОССИИ ПО Г. САНКТ-ПЕТЕРБУРГУ И ЛЕНИНГРАДСКОЙ ОБЛАСТИ",
        ],
    },
    Region {
        okato: "50",
        subdivision: "54",
        places: &["ГОР. НОВОСИБИРСК", "ГОР. БЕРДСК"],
        authorities: &[
            "ОТДЕЛОМ УФМС РОССИИ ПО НОВОСИБИРСКОЙ ОБЛ. В ЦЕНТРАЛЬНОМ Р-НЕ ГОР. НОВОСИБИРСКА",
            "ГУ МВД РОССИИ ПО НОВОСИБИРСКОЙ ОБЛАСТИ",
        ],
    },
    Region {
        okato: "65",
        subdivision: "66",
        places: &["ГОР. СВЕРДЛОВСК", "ГОР. ЕКАТЕРИНБУРГ", "ГОР. НИЖНИЙ ТАГИЛ"],
        authorities: &[
            "ОТДЕЛОМ УФМС РОССИИ ПО СВЕРДЛОВСКОЙ ОБЛ. В ЛЕНИНСКОМ Р-НЕ ГОР. ЕКАТЕРИНБУРГА",
            "ГУ МВД РОССИИ ПО СВЕРДЛОВСКОЙ ОБЛАСТИ",
        ],
    },
    Region {
        okato: "03",
        subdivision: "23",
        places: &["ГОР. КРАСНОДАР", "ГОР. СОЧИ", "ГОР. НОВОРОССИЙСК"],
        authorities: &[
            "ОТДЕЛОМ УФМС РОССИИ ПО КРАСНОДАРСКОМУ КРАЮ В ЗАПАДНОМ ОКР. ГОР. КРАСНОДАРА",
            "ГУ МВД РОССИИ ПО КРАСНОДАРСКОМУ КРАЮ",
        ],
    },
    Region {
        okato: "92",
        subdivision: "16",
        places: &["ГОР. КАЗАНЬ", "ГОР. НАБЕРЕЖНЫЕ ЧЕЛНЫ"],
        authorities: &[
            "ОТДЕЛОМ УФМС РОССИИ ПО РЕСП. ТАТАРСТАН В ВАХИТОВСКОМ Р-НЕ ГОР. КАЗАНИ",
            "МВД ПО РЕСПУБЛИКЕ ТАТАРСТАН",
        ],
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// The abbreviation printed in the passport.
    pub fn as_printed(&self) -> &'static str {
        match self {
            Gender::Male => "МУЖ.",
            Gender::Female => "ЖЕН.",
        }
    }
}

/// Text fields found on the passport spread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassportField {
    IssuedBy,
    IssueDate,
    DepartmentCode,
    Surname,
    Name,
    Patronymic,
    Gender,
    BirthDate,
    BirthPlace,
    Series,
    Number,
    /// Series and number together, as printed vertically along the page edge.
    SeriesAndNumber,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown passport field label: {0}")]
pub struct UnknownFieldError(pub String);

impl FromStr for PassportField {
    type Err = UnknownFieldError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        let normalized = label.trim().to_lowercase().replace(['-', ' '], "_");
        let field = match normalized.as_str() {
            "issued_by" | "authority" | "issue_authority" => PassportField::IssuedBy,
            "issue_date" | "date_of_issue" => PassportField::IssueDate,
            "department_code" | "division_code" | "code" => PassportField::DepartmentCode,
            "surname" | "last_name" => PassportField::Surname,
            "name" | "first_name" | "given_name" => PassportField::Name,
            "patronymic" | "middle_name" => PassportField::Patronymic,
            "gender" | "sex" => PassportField::Gender,
            "birth_date" | "date_of_birth" => PassportField::BirthDate,
            "birth_place" | "place_of_birth" => PassportField::BirthPlace,
            "series" => PassportField::Series,
            "number" => PassportField::Number,
            "number_group1" | "number_group2" | "series_number" => PassportField::SeriesAndNumber,
            _ => return Err(UnknownFieldError(label.to_string())),
        };
        Ok(field)
    }
}

fn serialize_date<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&date.format(DATE_FORMAT))
}

/// One synthetic passport holder.
#[derive(Debug, Clone, Serialize)]
pub struct PassportContent {
    pub gender: Gender,
    pub surname: String,
    pub name: String,
    pub patronymic: String,
    #[serde(serialize_with = "serialize_date")]
    pub birth_date: NaiveDate,
    pub birth_place: String,
    #[serde(serialize_with = "serialize_date")]
    pub issue_date: NaiveDate,
    pub issued_by: String,
    pub department_code: String,
    pub series: String,
    pub number: String,
}

fn pick<R: Rng + ?Sized>(rng: &mut R, items: &'static [&'static str]) -> &'static str {
    items.choose(rng).copied().unwrap_or_default()
}

fn feminine_surname(surname: &str) -> String {
    if ["ОВ", "ЕВ", "ЁВ", "ИН", "ЫН"].iter().any(|end| surname.ends_with(end)) {
        format!("{}А", surname)
    } else if let Some(stem) = surname.strip_suffix("ИЙ") {
        format!("{}АЯ", stem)
    } else {
        surname.to_string()
    }
}

fn add_years(date: NaiveDate, years: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(years * 12))
}

impl PassportContent {
    /// Draws a record relative to the current local date.
    pub fn random() -> Self {
        Self::random_with(&mut rand::thread_rng(), Local::now().date_naive())
    }

    /// Draws a record using `rng`, treating `today` as the present day.
    pub fn random_with<R: Rng + ?Sized>(rng: &mut R, today: NaiveDate) -> Self {
        let gender = if rng.gen_bool(0.5) {
            Gender::Male
        } else {
            Gender::Female
        };

        let surname = pick(rng, MALE_SURNAMES);
        let (patronymic_m, patronymic_f) = PATRONYMICS.choose(rng).copied().unwrap_or_default();
        let (surname, name, patronymic) = match gender {
            Gender::Male => (surname.to_string(), pick(rng, MALE_NAMES), patronymic_m),
            Gender::Female => (feminine_surname(surname), pick(rng, FEMALE_NAMES), patronymic_f),
        };

        let age = rng.gen_range(MIN_AGE..=MAX_AGE);
        let birth_date = today
            .checked_sub_months(Months::new(age * 12))
            .map(|d| d - Duration::days(rng.gen_range(0..365)))
            .unwrap_or(today);

        let issue_date = ISSUE_AGES
            .iter()
            .filter_map(|years| add_years(birth_date, *years))
            .find(|milestone| *milestone <= today)
            .map(|milestone| (milestone + Duration::days(rng.gen_range(0..90))).min(today))
            .unwrap_or(today);

        let birth_region = &REGIONS[rng.gen_range(0..REGIONS.len())];
        let issue_region = &REGIONS[rng.gen_range(0..REGIONS.len())];

        let department_code = format!(
            "{}{}-{:03}",
            issue_region.subdivision,
            rng.gen_range(0..=2),
            rng.gen_range(1..=999)
        );
        let series = format!("{} {:02}", issue_region.okato, issue_date.year() % 100);
        let number = format!("{:06}", rng.gen_range(0..1_000_000));

        Self {
            gender,
            surname,
            name: name.to_string(),
            patronymic: patronymic.to_string(),
            birth_date,
            birth_place: pick(rng, birth_region.places).to_string(),
            issue_date,
            issued_by: pick(rng, issue_region.authorities).to_string(),
            department_code,
            series,
            number,
        }
    }

    /// Text to print for `field`.
    pub fn get(&self, field: PassportField) -> String {
        match field {
            PassportField::IssuedBy => self.issued_by.clone(),
            PassportField::IssueDate => self.issue_date.format(DATE_FORMAT).to_string(),
            PassportField::DepartmentCode => self.department_code.clone(),
            PassportField::Surname => self.surname.clone(),
            PassportField::Name => self.name.clone(),
            PassportField::Patronymic => self.patronymic.clone(),
            PassportField::Gender => self.gender.as_printed().to_string(),
            PassportField::BirthDate => self.birth_date.format(DATE_FORMAT).to_string(),
            PassportField::BirthPlace => self.birth_place.clone(),
            PassportField::Series => self.series.clone(),
            PassportField::Number => self.number.clone(),
            PassportField::SeriesAndNumber => format!("{} {}", self.series, self.number),
        }
    }

    /// Text for an annotation label, or `None` when the label names no known field.
    pub fn text_for_label(&self, label: &str) -> Option<String> {
        label.parse::<PassportField>().ok().map(|field| self.get(field))
    }
}

/// Draws `count` records dated relative to today. A seed fixes the draw for a given day.
pub fn generate_contents(count: usize, seed: Option<u64>) -> Vec<PassportContent> {
    let mut rng = seed
        .map(StdRng::seed_from_u64)
        .unwrap_or_else(StdRng::from_entropy);
    let today = Local::now().date_naive();
    (0..count)
        .map(|_| PassportContent::random_with(&mut rng, today))
        .collect()
}

impl fmt::Display for PassportContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} ({}, {}) {} {}",
            self.surname,
            self.name,
            self.patronymic,
            self.gender.as_printed(),
            self.birth_date.format(DATE_FORMAT),
            self.series,
            self.number
        )
    }
}
