//! Record normalization
//!
//! Turns one nested [`ApiRecord`] into a [`NormalizedRow`]. Pure: no I/O,
//! no failure. Missing sub-objects yield NULL columns, flags become the
//! literal text `"True"`/`"False"`, numbers become their decimal text, and
//! strings are cut to their column width.

use crate::record::api::{flag_text, ApiRecord, Scalar};
use crate::record::row::NormalizedRow;
use chrono::NaiveDate;

/// Format of the import-date column
pub const IMPORT_DATE_FORMAT: &str = "%d/%m/%Y";

/// Truncates a value to at most `max_length` characters
///
/// Values at or under the limit come back unchanged; `None` stays `None`.
///
/// # Example
///
/// ```
/// use cnpj_harvest::record::truncate_value;
///
/// assert_eq!(truncate_value(Some("PE"), 2).as_deref(), Some("PE"));
/// assert_eq!(truncate_value(Some("PERNAMBUCO"), 2).as_deref(), Some("PE"));
/// assert_eq!(truncate_value(None, 2), None);
/// ```
pub fn truncate_value(value: Option<&str>, max_length: usize) -> Option<String> {
    value.map(|v| match v.char_indices().nth(max_length) {
        Some((cut, _)) => v[..cut].to_string(),
        None => v.to_string(),
    })
}

/// Flag text for a field inside an object that is present
///
/// An absent field reads as false; a missing parent object must be
/// handled by the caller (it yields NULL instead).
pub fn boolean_to_text(value: Option<&Scalar>) -> String {
    flag_text(value.map(Scalar::is_truthy).unwrap_or(false)).to_string()
}

/// Decimal text of a numeric field; absent stays absent
pub fn number_to_text(value: Option<&Scalar>) -> Option<String> {
    value.and_then(Scalar::to_text)
}

/// Text of a string field cut to its column width
fn text(value: Option<&Scalar>, max_length: usize) -> Option<String> {
    let raw = value.and_then(Scalar::to_text);
    truncate_value(raw.as_deref(), max_length)
}

/// Normalizes one registry record
///
/// `run_date` is the local date the run started; it fills the
/// `data_importacao` column of the extended layout.
pub fn normalize_record(record: &ApiRecord, run_date: NaiveDate) -> NormalizedRow {
    let qualificacao = record.qualificacao_responsavel.as_ref();
    let porte = record.porte_empresa.as_ref();
    let situacao = record.situacao_cadastral.as_ref();
    let endereco = record.endereco.as_ref();
    let ibge = endereco.and_then(|e| e.ibge.as_ref());
    let especial = record.situacao_especial.as_ref();
    let atividade = record.atividade_principal.as_ref();
    let mei = record.mei.as_ref();
    let simples = record.simples.as_ref();

    let phone = record
        .contato_telefonico
        .as_ref()
        .and_then(|phones| phones.first());
    let email = record
        .contato_email
        .as_ref()
        .and_then(|emails| emails.first());

    let telefone_completo = phone.and_then(|p| {
        let digits = p.completo.as_ref()?.to_text()?.replace('-', "");
        truncate_value(Some(&digits), 50)
    });

    NormalizedRow {
        cnpj: text(record.cnpj.as_ref(), 14),
        cnpj_raiz: text(record.cnpj_raiz.as_ref(), 8),
        filial_numero: number_to_text(record.filial_numero.as_ref()),
        razao_social: text(record.razao_social.as_ref(), 255),
        qualificacao_responsavel_codigo: qualificacao.and_then(|q| text(q.codigo.as_ref(), 50)),
        qualificacao_responsavel_descricao: qualificacao
            .and_then(|q| text(q.descricao.as_ref(), 100)),
        porte_empresa_codigo: porte.and_then(|p| text(p.codigo.as_ref(), 50)),
        porte_empresa_descricao: porte.and_then(|p| text(p.descricao.as_ref(), 100)),
        matriz_filial: text(record.matriz_filial.as_ref(), 50),
        codigo_natureza_juridica: text(record.codigo_natureza_juridica.as_ref(), 10),
        descricao_natureza_juridica: text(record.descricao_natureza_juridica.as_ref(), 100),
        nome_fantasia: text(record.nome_fantasia.as_ref(), 100),
        situacao_cadastral_atual: situacao.and_then(|s| text(s.situacao_atual.as_ref(), 50)),
        situacao_cadastral_motivo: situacao.and_then(|s| text(s.motivo.as_ref(), 255)),
        situacao_cadastral_data: situacao.and_then(|s| text(s.data.as_ref(), 50)),
        cep: endereco.and_then(|e| text(e.cep.as_ref(), 10)),
        tipo_logradouro: endereco.and_then(|e| text(e.tipo_logradouro.as_ref(), 50)),
        logradouro: endereco.and_then(|e| text(e.logradouro.as_ref(), 255)),
        numero: endereco.and_then(|e| text(e.numero.as_ref(), 10)),
        complemento: endereco.and_then(|e| text(e.complemento.as_ref(), 100)),
        bairro: endereco.and_then(|e| text(e.bairro.as_ref(), 100)),
        uf: endereco.and_then(|e| text(e.uf.as_ref(), 2)),
        municipio: endereco.and_then(|e| text(e.municipio.as_ref(), 100)),
        data_abertura: text(record.data_abertura.as_ref(), 10),
        ente_federativo: text(record.ente_federativo.as_ref(), 50),
        capital_social: number_to_text(record.capital_social.as_ref()),
        situacao_especial_descricao: especial.and_then(|s| text(s.descricao.as_ref(), 100)),
        situacao_especial_data: especial.and_then(|s| text(s.data.as_ref(), 50)),
        atividade_principal_codigo: atividade.and_then(|a| text(a.codigo.as_ref(), 50)),
        atividade_principal_descricao: atividade.and_then(|a| text(a.descricao.as_ref(), 100)),
        data_consulta: text(record.data_consulta.as_ref(), 50),
        bloqueado: Some(boolean_to_text(record.bloqueado.as_ref())),
        mei_optante: mei.map(|m| boolean_to_text(m.optante.as_ref())),
        data_opcao_mei: mei.and_then(|m| text(m.data_opcao_mei.as_ref(), 10)),
        data_exclusao_mei: mei.and_then(|m| text(m.data_exclusao_mei.as_ref(), 10)),
        mei_cpf: mei.and_then(|m| text(m.cpf.as_ref(), 14)),
        simples_optante: simples.map(|s| boolean_to_text(s.optante.as_ref())),
        data_opcao_simples: simples.and_then(|s| text(s.data_opcao_simples.as_ref(), 10)),
        data_exclusao_simples: simples.and_then(|s| text(s.data_exclusao_simples.as_ref(), 10)),
        telefone_completo,
        telefone_tipo: phone.and_then(|p| text(p.tipo.as_ref(), 50)),
        email: email.and_then(|e| text(e.email.as_ref(), 255)),
        email_valido: email.map(|e| boolean_to_text(e.valido.as_ref())),
        email_dominio: email.and_then(|e| text(e.dominio.as_ref(), 100)),
        ibge_municipio: ibge.and_then(|g| number_to_text(g.codigo_municipio.as_ref())),
        ibge_uf: ibge.and_then(|g| number_to_text(g.codigo_uf.as_ref())),
        ibge_latitude: ibge.and_then(|g| number_to_text(g.latitude.as_ref())),
        ibge_longitude: ibge.and_then(|g| number_to_text(g.longitude.as_ref())),
        data_importacao: Some(run_date.format(IMPORT_DATE_FORMAT).to_string()),
    }
}
