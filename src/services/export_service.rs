use rust_xlsxwriter::*;

use crate::error::Result;
use crate::models::candidate::{Candidate, CandidateProgress, StepStatus};

pub struct ExportService;

impl ExportService {
    /// Generate a styled XLSX workbook from a list of candidates.
    pub fn generate_candidates_xlsx(candidates: &[Candidate]) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Candidates")?;

        let header_bg = Color::RGB(0x0F172A);
        let header_text = Color::White;
        let alt_row_1 = Color::RGB(0xF8FAFC);
        let alt_row_2 = Color::White;
        let border_color = Color::RGB(0xE2E8F0);

        // Progress colors
        let progress_rejected = Color::RGB(0xEF4444);
        let progress_hired = Color::RGB(0x10B981);
        let progress_offer = Color::RGB(0x8B5CF6);
        let progress_active = Color::RGB(0xF59E0B);
        let progress_pending = Color::RGB(0x3B82F6);

        let columns = [
            ("#", 6.0),
            ("Name", 28.0),
            ("Email", 30.0),
            ("Role", 24.0),
            ("Level", 12.0),
            ("Location", 18.0),
            ("Status", 12.0),
            ("Progress", 18.0),
            ("Current Step", 24.0),
            ("Steps Completed", 16.0),
            ("CV", 30.0),
            ("Created", 20.0),
            ("Updated", 20.0),
        ];

        for (i, (_, width)) in columns.iter().enumerate() {
            worksheet.set_column_width(i as u16, *width)?;
        }

        let header_format = Format::new()
            .set_bold()
            .set_font_color(header_text)
            .set_background_color(header_bg)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);

        for (col, (title, _)) in columns.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *title, &header_format)?;
        }
        worksheet.set_row_height(0, 22)?;

        for (idx, candidate) in candidates.iter().enumerate() {
            let row = (idx + 1) as u32;
            let bg = if idx % 2 == 0 { alt_row_1 } else { alt_row_2 };

            let cell = Format::new()
                .set_background_color(bg)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);

            let progress_color = match candidate.progress {
                CandidateProgress::Rejected | CandidateProgress::OfferRejected => progress_rejected,
                CandidateProgress::Hired => progress_hired,
                CandidateProgress::Offered | CandidateProgress::OfferAccepted => progress_offer,
                CandidateProgress::Shortlisted | CandidateProgress::OnHold => progress_active,
                CandidateProgress::Pending => progress_pending,
            };
            let progress_cell = Format::new()
                .set_bold()
                .set_font_color(progress_color)
                .set_background_color(bg)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);

            let current_step_name = candidate
                .current_step_record()
                .map(|step| step.name.clone())
                .unwrap_or_default();
            let completed = candidate
                .steps
                .iter()
                .filter(|s| s.status == StepStatus::Completed)
                .count();

            worksheet.write_number_with_format(row, 0, (idx + 1) as f64, &cell)?;
            worksheet.write_string_with_format(row, 1, &candidate.name, &cell)?;
            worksheet.write_string_with_format(row, 2, &candidate.email, &cell)?;
            worksheet.write_string_with_format(row, 3, &candidate.role, &cell)?;
            worksheet.write_string_with_format(row, 4, candidate.level.as_str(), &cell)?;
            worksheet.write_string_with_format(row, 5, &candidate.location, &cell)?;
            worksheet.write_string_with_format(row, 6, candidate.status.as_str(), &cell)?;
            worksheet.write_string_with_format(row, 7, candidate.progress.as_str(), &progress_cell)?;
            worksheet.write_string_with_format(row, 8, &current_step_name, &cell)?;
            worksheet.write_string_with_format(
                row,
                9,
                &format!("{}/{}", completed, candidate.steps.len()),
                &cell,
            )?;
            worksheet.write_string_with_format(
                row,
                10,
                candidate.cv_url.as_deref().unwrap_or("-"),
                &cell,
            )?;
            worksheet.write_string_with_format(
                row,
                11,
                &candidate.created_at.format("%Y-%m-%d %H:%M").to_string(),
                &cell,
            )?;
            worksheet.write_string_with_format(
                row,
                12,
                &candidate.updated_at.format("%Y-%m-%d %H:%M").to_string(),
                &cell,
            )?;
        }

        // Freeze the header row.
        worksheet.set_freeze_panes(1, 0)?;

        let buffer = workbook.save_to_buffer()?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::candidate::{CandidateLevel, CandidateStatus, StepList};
    use chrono::Utc;
    use sqlx::types::Json;
    use uuid::Uuid;

    fn candidate(name: &str, email: &str) -> Candidate {
        Candidate {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            role: "Backend Engineer".to_string(),
            level: CandidateLevel::Mid,
            location: "Berlin".to_string(),
            status: CandidateStatus::Open,
            progress: CandidateProgress::Shortlisted,
            current_step: 0,
            steps: Json(StepList::default_pipeline()),
            cv_url: None,
            created_by: "tests".to_string(),
            version: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn workbook_is_generated_for_candidates() {
        let candidates = vec![
            candidate("Ada Lovelace", "ada@example.com"),
            candidate("Grace Hopper", "grace@example.com"),
        ];
        let bytes = ExportService::generate_candidates_xlsx(&candidates).unwrap();
        // XLSX is a zip container.
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn empty_list_still_yields_a_workbook() {
        let bytes = ExportService::generate_candidates_xlsx(&[]).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}
