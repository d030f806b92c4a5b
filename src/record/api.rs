//! Registry response model
//!
//! Every nested object is optional: the registry omits or nulls them freely,
//! and a missing object must only blank the columns that come from it.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value};

/// Body of a search response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    /// Total matching records across all pages, as reported by the registry
    ///
    /// Absent or null reads as 0; an integral float such as `250.0` is accepted.
    #[serde(default, deserialize_with = "reported_total")]
    pub total: u64,

    /// Records on this page
    #[serde(default)]
    pub cnpjs: Option<Vec<ApiRecord>>,
}

/// A leaf value whose JSON type the registry does not keep stable
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Flag(bool),
    Number(Number),
    Text(String),
    Structured(Value),
}

impl Scalar {
    /// Text form used for string and numeric columns
    ///
    /// Numbers keep their decimal representation (`1000`, `1000.0`,
    /// `-8.0539`). Nested structures have no column form.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Number(n) => Some(n.to_string()),
            Self::Flag(b) => Some(flag_text(*b).to_string()),
            Self::Structured(_) => None,
        }
    }

    /// Truthiness used for flag columns
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Flag(b) => *b,
            Self::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
            Self::Text(s) => !s.is_empty(),
            Self::Structured(v) => match v {
                Value::Array(items) => !items.is_empty(),
                Value::Object(map) => !map.is_empty(),
                _ => false,
            },
        }
    }
}

/// Literal text stored for flag columns
pub fn flag_text(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// One company as returned by the registry
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiRecord {
    pub cnpj: Option<Scalar>,
    pub cnpj_raiz: Option<Scalar>,
    pub filial_numero: Option<Scalar>,
    pub razao_social: Option<Scalar>,
    pub qualificacao_responsavel: Option<CodeDescription>,
    pub porte_empresa: Option<CodeDescription>,
    pub matriz_filial: Option<Scalar>,
    pub codigo_natureza_juridica: Option<Scalar>,
    pub descricao_natureza_juridica: Option<Scalar>,
    pub nome_fantasia: Option<Scalar>,
    pub situacao_cadastral: Option<RegistrationSituation>,
    pub endereco: Option<Address>,
    pub data_abertura: Option<Scalar>,
    pub ente_federativo: Option<Scalar>,
    pub capital_social: Option<Scalar>,
    pub situacao_especial: Option<SpecialSituation>,
    pub atividade_principal: Option<CodeDescription>,
    pub data_consulta: Option<Scalar>,
    pub bloqueado: Option<Scalar>,
    pub mei: Option<MeiRegime>,
    pub simples: Option<SimplesRegime>,
    #[serde(deserialize_with = "contact_list")]
    pub contato_telefonico: Option<Vec<PhoneContact>>,
    #[serde(deserialize_with = "contact_list")]
    pub contato_email: Option<Vec<EmailContact>>,
}

/// Reads a non-negative whole number, null as 0
fn reported_total<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<Number>::deserialize(deserializer)? else {
        return Ok(0);
    };

    number
        .as_u64()
        .or_else(|| {
            number
                .as_f64()
                .filter(|v| *v >= 0.0 && v.fract() == 0.0 && *v <= u64::MAX as f64)
                .map(|v| v as u64)
        })
        .ok_or_else(|| D::Error::custom(format!("invalid total: {}", number)))
}

/// Reads a contact list, treating anything but an array as absent
///
/// Entries that are not objects are skipped so one odd contact cannot
/// discard the record, let alone the page.
fn contact_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => Ok(Some(
            items
                .into_iter()
                .filter(Value::is_object)
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
        )),
        _ => Ok(None),
    }
}

/// Code/description pair used by several classifications
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CodeDescription {
    pub codigo: Option<Scalar>,
    pub descricao: Option<Scalar>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationSituation {
    pub situacao_atual: Option<Scalar>,
    pub motivo: Option<Scalar>,
    pub data: Option<Scalar>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Address {
    pub cep: Option<Scalar>,
    pub tipo_logradouro: Option<Scalar>,
    pub logradouro: Option<Scalar>,
    pub numero: Option<Scalar>,
    pub complemento: Option<Scalar>,
    pub bairro: Option<Scalar>,
    pub uf: Option<Scalar>,
    pub municipio: Option<Scalar>,
    pub ibge: Option<IbgeGeocode>,
}

/// IBGE codes and centroid of the municipality
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IbgeGeocode {
    pub codigo_municipio: Option<Scalar>,
    pub codigo_uf: Option<Scalar>,
    pub latitude: Option<Scalar>,
    pub longitude: Option<Scalar>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SpecialSituation {
    pub descricao: Option<Scalar>,
    pub data: Option<Scalar>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MeiRegime {
    pub optante: Option<Scalar>,
    pub data_opcao_mei: Option<Scalar>,
    pub data_exclusao_mei: Option<Scalar>,
    pub cpf: Option<Scalar>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SimplesRegime {
    pub optante: Option<Scalar>,
    pub data_opcao_simples: Option<Scalar>,
    pub data_exclusao_simples: Option<Scalar>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PhoneContact {
    pub completo: Option<Scalar>,
    pub tipo: Option<Scalar>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EmailContact {
    pub email: Option<Scalar>,
    pub valido: Option<Scalar>,
    pub dominio: Option<Scalar>,
}
