// src/services/export_service.rs

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rust_xlsxwriter::{Format, Workbook};

use crate::{
    common::error::AppError,
    models::registration::{Person, RegistrationDetail},
};

pub const SHEET_NAME: &str = "Inscritos";

pub const SPREADSHEET_HEADERS: [&str; 15] = [
    "Evento",
    "Status",
    "Data Inscrição",
    "Esposo - Nome",
    "Esposo - CPF",
    "Esposo - Telefone",
    "Esposo - Email",
    "Esposo - Nascimento",
    "Esposa - Nome",
    "Esposa - CPF",
    "Esposa - Telefone",
    "Esposa - Email",
    "Esposa - Nascimento",
    "Cidade",
    "Bairro",
];

pub const COLUMN_WIDTHS: [f64; 15] = [
    20.0, 10.0, 12.0, 30.0, 15.0, 15.0, 25.0, 12.0, 30.0, 15.0, 15.0, 25.0, 12.0, 20.0, 20.0,
];

const EMPTY: &str = "-";

// =============================================================================
//  FORMATAÇÃO
// =============================================================================

/// 11122233344 -> 111.222.333-44 (outros tamanhos ficam como estão)
pub fn format_cpf(cpf: &str) -> String {
    if cpf.len() != 11 || !cpf.chars().all(|c| c.is_ascii_digit()) {
        return cpf.to_string();
    }
    format!("{}.{}.{}-{}", &cpf[..3], &cpf[3..6], &cpf[6..9], &cpf[9..])
}

/// 11999990000 -> (11) 99999-0000 ; 1133330000 -> (11) 3333-0000
pub fn format_phone(phone: &str) -> String {
    if !phone.chars().all(|c| c.is_ascii_digit()) {
        return phone.to_string();
    }
    match phone.len() {
        11 => format!("({}) {}-{}", &phone[..2], &phone[2..7], &phone[7..]),
        10 => format!("({}) {}-{}", &phone[..2], &phone[2..6], &phone[6..]),
        0 => EMPTY.to_string(),
        _ => phone.to_string(),
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

// Horário de Brasília: UTC-3 o ano todo (sem horário de verão desde 2019)
const BRASILIA_OFFSET_SECS: i32 = 3 * 3600;

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    match FixedOffset::west_opt(BRASILIA_OFFSET_SECS) {
        Some(brasilia) => ts.with_timezone(&brasilia).format("%d/%m/%Y").to_string(),
        None => ts.format("%d/%m/%Y").to_string(),
    }
}

pub fn or_dash(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => EMPTY.to_string(),
    }
}

fn first_name(person: &Person) -> &str {
    person.name.split_whitespace().next().unwrap_or("")
}

// =============================================================================
//  PLANILHA
// =============================================================================

fn person_cells(person: &Person) -> [String; 5] {
    [
        person.name.clone(),
        format_cpf(&person.cpf),
        or_dash(Some(format_phone(&person.phone).as_str())),
        or_dash(Some(person.email.as_str())),
        format_date(person.birth_date),
    ]
}

/// Uma linha de 15 células por inscrição, na ordem recebida.
pub fn spreadsheet_rows(records: &[RegistrationDetail]) -> Vec<Vec<String>> {
    records
        .iter()
        .map(|record| {
            let mut row = Vec::with_capacity(SPREADSHEET_HEADERS.len());
            row.push(record.event_name.clone());
            row.push(record.registration.status.label().to_uppercase());
            row.push(format_timestamp(record.registration.created_at));
            row.extend(person_cells(&record.husband));
            row.extend(person_cells(&record.wife));
            row.push(or_dash(record.municipality_name.as_deref()));
            row.push(or_dash(record.registration.joint_data.neighborhood.as_deref()));
            row
        })
        .collect()
}

pub fn build_spreadsheet(records: &[RegistrationDetail]) -> Result<Vec<u8>, AppError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, (title, width)) in SPREADSHEET_HEADERS.iter().zip(COLUMN_WIDTHS).enumerate() {
        let col = col as u16;
        worksheet.write_string_with_format(0, col, *title, &header_format)?;
        worksheet.set_column_width(col, width)?;
    }

    for (index, row) in spreadsheet_rows(records).iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            worksheet.write_string(index as u32 + 1, col as u16, value)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

// =============================================================================
//  LISTA DE PRESENÇA / FICHA
// =============================================================================

pub const ROLL_CALL_HEADERS: [&str; 3] = ["Casal", "Telefones", "Status"];

/// "João & Maria" | "tel A / tel B" | STATUS
pub fn roll_call_rows(records: &[RegistrationDetail]) -> Vec<Vec<String>> {
    records
        .iter()
        .map(|record| {
            vec![
                format!("{} & {}", first_name(&record.husband), first_name(&record.wife)),
                format!(
                    "{} / {}",
                    format_phone(&record.husband.phone),
                    format_phone(&record.wife.phone)
                ),
                record.registration.status.label().to_uppercase(),
            ]
        })
        .collect()
}

pub struct FichaBlock {
    pub title: &'static str,
    pub lines: Vec<String>,
}

fn person_block(title: &'static str, person: &Person) -> FichaBlock {
    FichaBlock {
        title,
        lines: vec![
            format!("Nome: {}", person.name),
            format!(
                "CPF: {}   |   Nascimento: {}",
                format_cpf(&person.cpf),
                format_date(person.birth_date)
            ),
            format!("Email: {}", or_dash(Some(person.email.as_str()))),
            format!("Telefone: {}", format_phone(&person.phone)),
        ],
    }
}

/// Os quatro blocos fixos da ficha, sempre nesta ordem.
pub fn ficha_blocks(record: &RegistrationDetail) -> Vec<FichaBlock> {
    let joint = &record.registration.joint_data;
    let wedding = joint.wedding.clone().unwrap_or_default();
    let city = match (&record.municipality_name, &record.municipality_state) {
        (Some(name), Some(state)) => format!("{} - {}", name, state),
        (Some(name), None) => name.clone(),
        _ => EMPTY.to_string(),
    };

    vec![
        person_block("DADOS DO ESPOSO", &record.husband),
        person_block("DADOS DA ESPOSA", &record.wife),
        FichaBlock {
            title: "ENDEREÇO RESIDENCIAL",
            lines: vec![
                format!("Endereço: {}", or_dash(Some(joint.address.as_str()))),
                format!(
                    "Bairro: {}   |   Cidade: {}",
                    or_dash(joint.neighborhood.as_deref()),
                    city
                ),
            ],
        },
        FichaBlock {
            title: "DADOS DO MATRIMÔNIO",
            lines: vec![
                format!(
                    "Data Casamento: {}",
                    wedding.date.map(format_date).unwrap_or_else(|| EMPTY.to_string())
                ),
                format!(
                    "Igreja: {}   |   Paróquia: {}",
                    or_dash(wedding.church.as_deref()),
                    or_dash(Some(joint.parish.as_str()))
                ),
            ],
        },
    ]
}
