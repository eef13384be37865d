//! Result projection
//!
//! Maps the tracked result list into a fixed-width row/column view for
//! display and CSV export. The column count is fixed at construction
//! (the submitted `max_num_seqs`): every row gets exactly that many
//! prediction cells, padded with empty cells when a row has fewer
//! predictions, so columns never shift between rows.

use std::io::Write;

use mathqa_core::domain::job::EvaluationResult;

/// Fixed-width projection of evaluation results.
#[derive(Debug, Clone)]
pub struct ResultProjector {
    num_predictions: usize,
}

impl ResultProjector {
    /// Create a projector emitting `num_predictions` prediction columns.
    pub fn new(num_predictions: usize) -> Self {
        Self { num_predictions }
    }

    /// The configured prediction column count.
    pub fn num_predictions(&self) -> usize {
        self.num_predictions
    }

    /// Header row: `ID, Problem, True Answer, Predicted Answer,
    /// Pred 1 .. Pred N`.
    pub fn header(&self) -> Vec<String> {
        let mut cells = vec![
            "ID".to_string(),
            "Problem".to_string(),
            "True Answer".to_string(),
            "Predicted Answer".to_string(),
        ];
        for i in 1..=self.num_predictions {
            cells.push(format!("Pred {}", i));
        }
        cells
    }

    /// Project one result into exactly `4 + N` cells.
    ///
    /// Missing prediction slots become empty cells; extra predictions
    /// beyond the configured width are dropped.
    pub fn row(&self, result: &EvaluationResult) -> Vec<String> {
        let mut cells = vec![
            result.id.clone(),
            result.problem.clone(),
            result.true_answer.clone(),
            result.predicted_answer.clone(),
        ];
        for i in 0..self.num_predictions {
            cells.push(
                result
                    .predictions
                    .get(i)
                    .map(|p| p.answer.clone())
                    .unwrap_or_default(),
            );
        }
        cells
    }

    /// Project all results, in stored order.
    pub fn rows<'a>(
        &'a self,
        results: &'a [EvaluationResult],
    ) -> impl Iterator<Item = Vec<String>> + 'a {
        results.iter().map(|result| self.row(result))
    }

    /// Write the projection as CSV: one header row, then one row per
    /// result in stored order.
    pub fn write_csv<W: Write>(
        &self,
        results: &[EvaluationResult],
        writer: W,
    ) -> Result<(), csv::Error> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(self.header())?;
        for row in self.rows(results) {
            csv.write_record(row)?;
        }
        csv.flush()?;
        Ok(())
    }

    /// Convenience wrapper producing the CSV as a string.
    pub fn to_csv_string(&self, results: &[EvaluationResult]) -> Result<String, csv::Error> {
        let mut buffer = Vec::new();
        self.write_csv(results, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
