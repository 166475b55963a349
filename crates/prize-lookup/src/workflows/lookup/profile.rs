use super::identifier::Identifier;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

const STANDARD_FIRST_NAMES: [&str; 24] = [
    "João", "Maria", "José", "Ana", "Francisco", "Antônio", "Carlos", "Mariana", "Paulo",
    "Fernanda", "Pedro", "Juliana", "Lucas", "Camila", "Rafael", "Beatriz", "Gabriel", "Larissa",
    "Daniel", "Patrícia", "Roberto", "Adriana", "Fernando", "Carla",
];

const STANDARD_SURNAMES: [&str; 24] = [
    "Silva", "Santos", "Oliveira", "Souza", "Rodrigues", "Ferreira", "Alves", "Pereira", "Lima",
    "Gomes", "Costa", "Ribeiro", "Martins", "Carvalho", "Almeida", "Lopes", "Soares", "Fernandes",
    "Vieira", "Barbosa", "Rocha", "Dias", "Monteiro", "Cardoso",
];

const STANDARD_LOCATIONS: [&str; 18] = [
    "São Paulo, SP",
    "Rio de Janeiro, RJ",
    "Belo Horizonte, MG",
    "Salvador, BA",
    "Fortaleza, CE",
    "Brasília, DF",
    "Curitiba, PR",
    "Recife, PE",
    "Porto Alegre, RS",
    "Manaus, AM",
    "Belém, PA",
    "Goiânia, GO",
    "Guarulhos, SP",
    "Campinas, SP",
    "São Luís, MA",
    "São Gonçalo, RJ",
    "Maceió, AL",
    "Duque de Caxias, RJ",
];

/// Which reference list a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceList {
    FirstName,
    Surname,
    Location,
}

impl ReferenceList {
    pub const fn label(self) -> &'static str {
        match self {
            Self::FirstName => "first_name",
            Self::Surname => "surname",
            Self::Location => "location",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReferenceDataError {
    #[error("reference list '{}' is empty", .0.label())]
    EmptyList(ReferenceList),
    #[error("failed to read reference data: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid reference data CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Immutable name and location lists the generator indexes into. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    first_names: Arc<[String]>,
    surnames: Arc<[String]>,
    locations: Arc<[String]>,
}

impl ReferenceData {
    pub fn new(
        first_names: Vec<String>,
        surnames: Vec<String>,
        locations: Vec<String>,
    ) -> Result<Self, ReferenceDataError> {
        for (list, values) in [
            (ReferenceList::FirstName, &first_names),
            (ReferenceList::Surname, &surnames),
            (ReferenceList::Location, &locations),
        ] {
            if values.is_empty() {
                return Err(ReferenceDataError::EmptyList(list));
            }
        }

        Ok(Self {
            first_names: first_names.into(),
            surnames: surnames.into(),
            locations: locations.into(),
        })
    }

    pub fn standard() -> Self {
        Self {
            first_names: owned(&STANDARD_FIRST_NAMES),
            surnames: owned(&STANDARD_SURNAMES),
            locations: owned(&STANDARD_LOCATIONS),
        }
    }

    /// Reads a `list,value` CSV with a header row, e.g. `first_name,Maria`.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ReferenceDataError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut first_names = Vec::new();
        let mut surnames = Vec::new();
        let mut locations = Vec::new();

        for row in csv_reader.deserialize::<ReferenceRow>() {
            let row = row?;
            match row.list {
                ReferenceList::FirstName => first_names.push(row.value),
                ReferenceList::Surname => surnames.push(row.value),
                ReferenceList::Location => locations.push(row.value),
            }
        }

        Self::new(first_names, surnames, locations)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ReferenceDataError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn first_names(&self) -> &[String] {
        &self.first_names
    }

    pub fn surnames(&self) -> &[String] {
        &self.surnames
    }

    pub fn locations(&self) -> &[String] {
        &self.locations
    }
}

fn owned(values: &[&str]) -> Arc<[String]> {
    values.iter().map(|value| value.to_string()).collect()
}

#[derive(Debug, Deserialize)]
struct ReferenceRow {
    list: ReferenceList,
    value: String,
}

/// Last day a 2025 campaign prize can be redeemed.
pub const CAMPAIGN_EXPIRY: NaiveDate = match NaiveDate::from_ymd_opt(2025, 12, 31) {
    Some(date) => date,
    None => panic!("campaign expiry is not a calendar date"),
};

/// Fixed per-campaign prize metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Campaign {
    pub protocol_prefix: String,
    pub expiry: NaiveDate,
}

impl Campaign {
    pub fn standard() -> Self {
        Self {
            protocol_prefix: "TSN-2025-".to_string(),
            expiry: CAMPAIGN_EXPIRY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub full_name: String,
    pub formatted_identifier: String,
    pub location: String,
}

/// Money held as integer cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PrizeAmount {
    cents: u64,
}

impl PrizeAmount {
    pub const fn from_reais(reais: u64) -> Self {
        Self { cents: reais * 100 }
    }

    pub const fn cents(self) -> u64 {
        self.cents
    }

    /// Brazilian notation: `.` groups thousands, `,` separates centavos (`3.038,00`).
    pub fn formatted(self) -> String {
        let reais = (self.cents / 100).to_string();
        let mut grouped = String::with_capacity(reais.len() + reais.len() / 3);
        for (index, digit) in reais.chars().enumerate() {
            if index > 0 && (reais.len() - index) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(digit);
        }
        format!("{grouped},{:02}", self.cents % 100)
    }
}

impl fmt::Display for PrizeAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.cents / 100, self.cents % 100)
    }
}

impl Serialize for PrizeAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrizeRecord {
    pub amount: PrizeAmount,
    pub protocol_code: String,
    pub expiry_date: NaiveDate,
}

impl PrizeRecord {
    pub fn expiry_label(&self) -> String {
        self.expiry_date.format("%d/%m/%Y").to_string()
    }
}

/// Terminal output of one lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupResult {
    pub profile: Profile,
    pub prize: Option<PrizeRecord>,
}

impl LookupResult {
    pub fn has_prize(&self) -> bool {
        self.prize.is_some()
    }
}

/// Derives synthetic profiles purely from identifier digits.
#[derive(Debug, Clone)]
pub struct ProfileGenerator {
    reference: ReferenceData,
    campaign: Campaign,
}

impl ProfileGenerator {
    pub fn new(reference: ReferenceData, campaign: Campaign) -> Self {
        Self {
            reference,
            campaign,
        }
    }

    pub fn standard() -> Self {
        Self::new(ReferenceData::standard(), Campaign::standard())
    }

    pub fn generate(
        &self,
        identifier: &Identifier,
        has_prize: bool,
    ) -> (Profile, Option<PrizeRecord>) {
        let digit_sum = identifier.digit_sum() as usize;

        let first_name = pick(self.reference.first_names(), digit_sum);
        let surname = pick(self.reference.surnames(), digit_sum * 2);
        let location = pick(self.reference.locations(), digit_sum * 3);

        let profile = Profile {
            full_name: format!("{first_name} {surname}"),
            formatted_identifier: identifier.formatted(),
            location: location.to_string(),
        };

        let prize = has_prize.then(|| PrizeRecord {
            amount: PrizeAmount::from_reais(500 + (digit_sum as u64 * 47) % 4500),
            protocol_code: format!("{}{:06}", self.campaign.protocol_prefix, digit_sum * 123),
            expiry_date: self.campaign.expiry,
        });

        (profile, prize)
    }

    pub fn lookup_result(&self, identifier: &Identifier, has_prize: bool) -> LookupResult {
        let (profile, prize) = self.generate(identifier, has_prize);
        LookupResult { profile, prize }
    }
}

// ReferenceData guarantees non-empty lists.
fn pick(values: &[String], seed: usize) -> &str {
    &values[seed % values.len()]
}
