//! 报名 CSV 批量导入
//!
//! 读取招生办导出的报名表（列：Application No / Applicant Name /
//! Mobile No / Applied Programme / Campus / Interview Date /
//! Interview Time / Interview Venue / Next Check in Venue），
//! 按报名号去重，生成初始状态为 REGISTERED 的考生记录。

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use tracing::warn;

use crate::error::AppResult;
use crate::models::applicant::{Applicant, ApplicantStatus};

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Application No")]
    application_number: String,
    #[serde(rename = "Applicant Name")]
    name: String,
    #[serde(rename = "Mobile No")]
    phone: String,
    #[serde(rename = "Applied Programme")]
    program: String,
    #[serde(rename = "Campus")]
    campus: String,
    #[serde(rename = "Interview Date")]
    interview_date: String,
    #[serde(rename = "Interview Time")]
    interview_time: String,
    #[serde(rename = "Interview Venue")]
    location: String,
    #[serde(rename = "Next Check in Venue")]
    instructions: String,
}

/// 解析报名表日期（格式 `31/01/2026`，解析失败按缺失处理）
fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%d/%m/%Y").ok()
}

/// 解析报名表时间（格式 `09:30 AM`，解析失败按缺失处理）
fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%I:%M %p").ok()
}

/// 从任意 Read 源加载考生列表
///
/// # 返回
/// 去重后的考生列表（重复报名号保留第一条）
pub fn load_applicants_from_reader<R: Read>(reader: R) -> AppResult<Vec<Applicant>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut applicants = Vec::new();
    let mut seen = HashSet::new();

    for result in csv_reader.deserialize::<CsvRow>() {
        let row = result?;
        let application_number = row.application_number.trim().to_string();

        if application_number.is_empty() {
            continue;
        }
        if !seen.insert(application_number.clone()) {
            warn!("⚠️ 报名号重复，已跳过: {}", application_number);
            continue;
        }

        applicants.push(Applicant {
            application_number,
            name: row.name.trim().to_string(),
            phone: row.phone.trim().to_string(),
            program: row.program.trim().to_string(),
            campus: row.campus.trim().to_string(),
            interview_date: parse_date(&row.interview_date),
            interview_time: parse_time(&row.interview_time),
            location: row.location.trim().to_string(),
            instructions: row.instructions.trim().to_string(),
            status: ApplicantStatus::Registered,
            arrived_at: None,
            document_verified_at: None,
            interviewed_at: None,
            interviewed_by_emails: None,
            assigned_panel_id: None,
        });
    }

    Ok(applicants)
}

/// 从文件路径加载考生列表
pub fn load_applicants_csv(path: &Path) -> AppResult<Vec<Applicant>> {
    let file = std::fs::File::open(path)?;
    load_applicants_from_reader(file)
}
