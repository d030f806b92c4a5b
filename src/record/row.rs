//! Flat row layout shared by the normalizer, the schema and the loader
//!
//! The column list is declared once: field order here is the insert order,
//! and the widths drive both truncation checks and the table's CHECK
//! constraints.

use serde::Deserialize;
use std::fmt;

/// Which target table layout a run writes to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVariant {
    /// The registry columns only
    #[default]
    Base,
    /// Registry columns plus the raw street line and the import date
    Extended,
}

impl SchemaVariant {
    /// Columns of this layout, in insert order
    pub fn columns(&self) -> Vec<&'static Column> {
        LAYOUT.iter().filter(|c| c.in_variant(*self)).collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Extended => "extended",
        }
    }
}

impl fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which layouts carry a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnScope {
    All,
    ExtendedOnly,
}

/// One target column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    /// Maximum length in characters; `None` for coerced numeric columns
    pub width: Option<usize>,
    pub scope: ColumnScope,
}

impl Column {
    pub fn in_variant(&self, variant: SchemaVariant) -> bool {
        match self.scope {
            ColumnScope::All => true,
            ColumnScope::ExtendedOnly => variant == SchemaVariant::Extended,
        }
    }
}

macro_rules! row_layout {
    ($($field:ident : $width:expr, $scope:ident;)*) => {
        /// One company record flattened to text columns
        ///
        /// Every value is optional; `None` is stored as SQL NULL.
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct NormalizedRow {
            $(pub $field: Option<String>,)*
        }

        /// Every column of every layout, in insert order
        pub const LAYOUT: &[Column] = &[
            $(Column {
                name: stringify!($field),
                width: $width,
                scope: ColumnScope::$scope,
            },)*
        ];

        impl NormalizedRow {
            fn all_values(&self) -> Vec<Option<&str>> {
                vec![$(self.$field.as_deref(),)*]
            }
        }
    };
}

row_layout! {
    cnpj: Some(14), All;
    cnpj_raiz: Some(8), All;
    filial_numero: None, All;
    razao_social: Some(255), All;
    qualificacao_responsavel_codigo: Some(50), All;
    qualificacao_responsavel_descricao: Some(100), All;
    porte_empresa_codigo: Some(50), All;
    porte_empresa_descricao: Some(100), All;
    matriz_filial: Some(50), All;
    codigo_natureza_juridica: Some(10), All;
    descricao_natureza_juridica: Some(100), All;
    nome_fantasia: Some(100), All;
    situacao_cadastral_atual: Some(50), All;
    situacao_cadastral_motivo: Some(255), All;
    situacao_cadastral_data: Some(50), All;
    cep: Some(10), All;
    tipo_logradouro: Some(50), All;
    logradouro: Some(255), ExtendedOnly;
    numero: Some(10), All;
    complemento: Some(100), All;
    bairro: Some(100), All;
    uf: Some(2), All;
    municipio: Some(100), All;
    data_abertura: Some(10), All;
    ente_federativo: Some(50), All;
    capital_social: None, All;
    situacao_especial_descricao: Some(100), All;
    situacao_especial_data: Some(50), All;
    atividade_principal_codigo: Some(50), All;
    atividade_principal_descricao: Some(100), All;
    data_consulta: Some(50), All;
    bloqueado: Some(5), All;
    mei_optante: Some(5), All;
    data_opcao_mei: Some(10), All;
    data_exclusao_mei: Some(10), All;
    mei_cpf: Some(14), All;
    simples_optante: Some(5), All;
    data_opcao_simples: Some(10), All;
    data_exclusao_simples: Some(10), All;
    telefone_completo: Some(50), All;
    telefone_tipo: Some(50), All;
    email: Some(255), All;
    email_valido: Some(5), All;
    email_dominio: Some(100), All;
    ibge_municipio: None, All;
    ibge_uf: None, All;
    ibge_latitude: None, All;
    ibge_longitude: None, All;
    data_importacao: Some(10), ExtendedOnly;
}

impl NormalizedRow {
    /// Values for the given layout, aligned with [`SchemaVariant::columns`]
    pub fn values_for(&self, variant: SchemaVariant) -> Vec<Option<&str>> {
        LAYOUT
            .iter()
            .zip(self.all_values())
            .filter(|(column, _)| column.in_variant(variant))
            .map(|(_, value)| value)
            .collect()
    }

    /// Looks up a value by column name
    pub fn get(&self, column: &str) -> Option<&str> {
        LAYOUT
            .iter()
            .position(|c| c.name == column)
            .and_then(|i| self.all_values()[i])
    }
}
