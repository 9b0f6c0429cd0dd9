use std::sync::Arc;

use rand::Rng;

use crate::error::Result;
use crate::llm::{prompts, CompletionOptions, Generator};
use crate::models::{ConsigneeIdentity, ConsigneeRecord, Country};
use crate::recovery::{recover, schemas, RecoveryError};

fn digits<R: Rng + ?Sized>(rng: &mut R, count: usize) -> String {
    (0..count)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// `YYMMDD` for a birth date in 1970..=2000. Days stop at 28 so every month
/// is valid.
fn birth_segment<R: Rng + ?Sized>(rng: &mut R) -> String {
    let year: u32 = rng.gen_range(1970..=2000);
    let month: u32 = rng.gen_range(1..=12);
    let day: u32 = rng.gen_range(1..=28);
    format!("{:02}{month:02}{day:02}", year % 100)
}

/// Individual identification number in the country's layout.
pub fn generate_iin<R: Rng + ?Sized>(country: Country, rng: &mut R) -> String {
    match country {
        Country::Russia => digits(rng, 12),
        Country::Kazakhstan => {
            let birth = birth_segment(rng);
            birth + &digits(rng, 6)
        }
        Country::Kyrgyzstan | Country::Uzbekistan => {
            let birth = birth_segment(rng);
            birth + &digits(rng, 8)
        }
    }
}

pub fn generate_phone<R: Rng + ?Sized>(country: Country, rng: &mut R) -> String {
    format!(
        "{}{}",
        country.dialling_code(),
        digits(rng, country.phone_digits())
    )
}

/// Synthetic consignee records: the generator invents a plausible name and
/// address, identifiers are generated locally.
#[derive(Clone)]
pub struct ConsigneeService {
    generator: Arc<dyn Generator>,
}

impl ConsigneeService {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    pub async fn generate(&self, country: Country) -> Result<ConsigneeRecord> {
        let options = CompletionOptions {
            system_prompt: Some(prompts::CONSIGNEE_SYSTEM_PROMPT.to_string()),
            temperature: Some(0.7),
            max_tokens: Some(200),
            ..Default::default()
        };
        let raw = self
            .generator
            .complete(&prompts::consignee_prompt(country.as_str()), None, &options)
            .await?;

        let record = recover(&raw, &schemas::consignee()).inspect_err(|e| {
            tracing::warn!(%country, kind = e.kind(), raw_response = %raw, "Unrecoverable consignee response");
        })?;
        let identity: ConsigneeIdentity = record.deserialize()?;

        let (name, address) = match (identity.consignee_name, identity.consignee_address) {
            (Some(name), Some(address)) => (name, address),
            (name, address) => {
                let mut missing = Vec::new();
                if name.is_none() {
                    missing.push("consignee_name".to_string());
                }
                if address.is_none() {
                    missing.push("consignee_address".to_string());
                }
                return Err(RecoveryError::SchemaViolation { raw, missing }.into());
            }
        };

        let mut rng = rand::thread_rng();
        Ok(ConsigneeRecord {
            consignee_name: name,
            consignee_address: address,
            consignee_iin: generate_iin(country, &mut rng),
            consignee_tel: generate_phone(country, &mut rng),
        })
    }
}
