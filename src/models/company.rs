// src/models/company.rs

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

// ---
// Company (o "Tenant")
// ---
// Raiz de tudo: usuários e habilitação de módulos pertencem a uma company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,

    #[schema(example = "Obrix")]
    pub name: String,

    #[schema(example = "Obrix System S.A. de C.V.")]
    pub legal_name: Option<String>,

    #[schema(example = "OBR010101AAA")]
    pub rfc: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Resumo devolvido junto com o token no login.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanySummary {
    pub id: Uuid,
    pub name: String,
    pub legal_name: Option<String>,
    pub rfc: Option<String>,
}

impl From<Company> for CompanySummary {
    fn from(company: Company) -> Self {
        Self {
            id: company.id,
            name: company.name,
            legal_name: company.legal_name,
            rfc: company.rfc,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCompanyPayload {
    #[validate(length(min = 2, max = 200, message = "O nome deve ter entre 2 e 200 caracteres."))]
    #[schema(example = "Obrix")]
    pub name: String,

    #[validate(length(min = 2, max = 250, message = "A razão social deve ter entre 2 e 250 caracteres."))]
    #[schema(example = "Obrix System S.A. de C.V.")]
    pub legal_name: Option<String>,

    #[validate(custom(function = "validate_rfc"))]
    #[schema(example = "OBR010101AAA")]
    pub rfc: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCompanyPayload {
    #[validate(length(min = 2, max = 200, message = "O nome deve ter entre 2 e 200 caracteres."))]
    pub name: Option<String>,

    #[validate(length(min = 2, max = 250, message = "A razão social deve ter entre 2 e 250 caracteres."))]
    pub legal_name: Option<String>,

    #[validate(custom(function = "validate_rfc"))]
    pub rfc: Option<String>,
}

/// Formato geral do RFC mexicano: 3-4 letras (A-Z, &, Ñ), 6 dígitos e 3 alfanuméricos.
/// Sem `(?i)`: o case folding Unicode aceitaria `K` (Kelvin) e `ſ` como letras.
static RFC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z&Ññ]{3,4}[0-9]{6}[A-Za-z0-9]{3}$").expect("regex de RFC inválida")
});

pub fn validate_rfc(rfc: &str) -> Result<(), ValidationError> {
    if RFC_RE.is_match(rfc) {
        return Ok(());
    }
    let mut err = ValidationError::new("rfc");
    err.message = Some("RFC inválido (formato geral).".into());
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc_accepts_company_and_person_formats() {
        assert!(validate_rfc("OBR010101AAA").is_ok());
        assert!(validate_rfc("obr010101a1a").is_ok());
        assert!(validate_rfc("GODE561231GR8").is_ok());
        assert!(validate_rfc("&ÑA010101AAA").is_ok());
    }

    #[test]
    fn rfc_rejects_malformed_values() {
        assert!(validate_rfc("").is_err());
        assert!(validate_rfc("OB010101AAA").is_err());
        assert!(validate_rfc("OBR01010AAA").is_err());
        assert!(validate_rfc("OBR010101AA").is_err());
        assert!(validate_rfc("OBR010101AA-").is_err());
    }

    #[test]
    fn rfc_rejects_letters_that_only_match_after_case_mapping() {
        // "ß" vira "SS" e "ı" vira "I" em to_uppercase().
        assert!(validate_rfc("Oß010101AAA").is_err());
        assert!(validate_rfc("ıBR010101AAA").is_err());
        assert!(validate_rfc("OBR010101Aı1").is_err());
        // Kelvin (U+212A) e s longo (U+017F) casam com [a-z] sob case folding.
        assert!(validate_rfc("\u{212A}BR010101AAA").is_err());
        assert!(validate_rfc("OB\u{17F}010101AAA").is_err());
        // Dígitos não-ASCII.
        assert!(validate_rfc("OBR٠١٠١٠١AAA").is_err());
    }

    #[test]
    fn payload_validation_reports_rfc_field() {
        let payload = CreateCompanyPayload {
            name: "Obrix".into(),
            legal_name: None,
            rfc: Some("nope".into()),
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("rfc"));
    }
}
