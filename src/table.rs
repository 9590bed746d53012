use crate::models::{AgeBand, BreakdownRecord, Observation, Sex};
use serde::Serialize;

/// Daily national counts in chronological order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TimeSeriesTable {
    pub dates: Vec<String>,
    pub cases: Vec<Option<i64>>,
    pub deaths: Vec<Option<i64>>,
}

impl TimeSeriesTable {
    /// The API lists newest first; rows are put back in date order.
    pub fn from_records(mut records: Vec<Observation>) -> Self {
        records.sort_by(|a, b| a.date.cmp(&b.date));

        let mut table = Self::default();
        for record in records {
            table.dates.push(record.date.unwrap_or_default());
            table.cases.push(record.new_cases);
            table.deaths.push(record.new_deaths);
        }
        table
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn last_date(&self) -> Option<&str> {
        self.dates.last().map(String::as_str)
    }

    /// The last `rows` rows, transposed so each column becomes a row.
    pub fn recent(&self, rows: usize) -> RecentTable {
        let start = self.len().saturating_sub(rows);
        let cells = |column: &[Option<i64>]| -> Vec<String> {
            column[start..]
                .iter()
                .map(|value| value.map(|v| v.to_string()).unwrap_or_default())
                .collect()
        };

        RecentTable {
            header: self.dates[start..].to_vec(),
            rows: vec![
                ("Number of Cases".to_string(), cells(&self.cases)),
                ("Number of Deaths".to_string(), cells(&self.deaths)),
            ],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RecentTable {
    pub header: Vec<String>,
    pub rows: Vec<(String, Vec<String>)>,
}

impl RecentTable {
    pub fn is_empty(&self) -> bool {
        self.header.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AgeColumns {
    pub ages: Vec<String>,
    pub rates: Vec<Option<f64>>,
    pub values: Vec<Option<i64>>,
}

impl AgeColumns {
    fn from_bands(bands: &[AgeBand]) -> Self {
        let mut columns = Self::default();
        for band in bands {
            columns.ages.push(band.age.clone().unwrap_or_default());
            columns.rates.push(band.rate);
            columns.values.push(band.value);
        }
        columns
    }

    pub fn is_empty(&self) -> bool {
        self.ages.is_empty()
    }
}

/// Case counts by age band, split by sex, from the newest breakdown record.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BreakdownTable {
    pub female: AgeColumns,
    pub male: AgeColumns,
}

impl BreakdownTable {
    pub fn from_records(records: &[BreakdownRecord]) -> Self {
        match records.first() {
            Some(latest) => Self {
                female: AgeColumns::from_bands(latest.female.as_deref().unwrap_or_default()),
                male: AgeColumns::from_bands(latest.male.as_deref().unwrap_or_default()),
            },
            None => Self::default(),
        }
    }

    pub fn columns(&self, sex: Sex) -> &AgeColumns {
        match sex {
            Sex::Female => &self.female,
            Sex::Male => &self.male,
        }
    }

    pub fn total(&self, sex: Sex) -> i64 {
        self.columns(sex).values.iter().flatten().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.female.is_empty() && self.male.is_empty()
    }
}

/// New cases per local authority for a single date. Rows without an area
/// name are kept and plot as gaps.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegionTable {
    pub date: String,
    pub areas: Vec<Option<String>>,
    pub cases: Vec<Option<i64>>,
}

impl RegionTable {
    pub fn from_records(date: impl Into<String>, records: Vec<Observation>) -> Self {
        let mut table = Self {
            date: date.into(),
            ..Self::default()
        };
        for record in records.into_iter().rev() {
            table.areas.push(record.area_name);
            table.cases.push(record.new_cases);
        }
        table
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(date: &str, cases: Option<i64>, deaths: Option<i64>) -> Observation {
        Observation {
            date: Some(date.to_string()),
            new_cases: cases,
            new_deaths: deaths,
            area_name: None,
        }
    }

    fn band(age: &str, value: i64) -> AgeBand {
        AgeBand {
            age: Some(age.to_string()),
            rate: Some(value as f64 / 10.0),
            value: Some(value),
        }
    }

    #[test]
    fn time_series_is_chronological() {
        let table = TimeSeriesTable::from_records(vec![
            obs("2021-01-03", Some(30), Some(3)),
            obs("2021-01-02", Some(20), None),
            obs("2021-01-01", Some(10), Some(1)),
        ]);
        assert_eq!(table.dates, vec!["2021-01-01", "2021-01-02", "2021-01-03"]);
        assert_eq!(table.cases, vec![Some(10), Some(20), Some(30)]);
        assert_eq!(table.deaths, vec![Some(1), None, Some(3)]);
        assert_eq!(table.last_date(), Some("2021-01-03"));
    }

    #[test]
    fn recent_rows_are_transposed() {
        let records = (1..=12)
            .map(|d| obs(&format!("2021-01-{d:02}"), Some(d), None))
            .collect();
        let recent = TimeSeriesTable::from_records(records).recent(10);
        assert_eq!(recent.header.len(), 10);
        assert_eq!(recent.header[0], "2021-01-03");
        assert_eq!(recent.rows[0].0, "Number of Cases");
        assert_eq!(recent.rows[0].1[9], "12");
        assert_eq!(recent.rows[1].1[0], "");
    }

    #[test]
    fn recent_on_short_series_keeps_every_row() {
        let table = TimeSeriesTable::from_records(vec![obs("2021-01-01", Some(1), Some(0))]);
        let recent = table.recent(10);
        assert_eq!(recent.header, vec!["2021-01-01"]);
        assert!(TimeSeriesTable::default().recent(10).is_empty());
    }

    #[test]
    fn breakdown_totals_match_source_values() {
        let female = vec![band("0_to_4", 120), band("5_to_9", 80), band("90+", 15)];
        let male = vec![band("0_to_4", 130), band("5_to_9", 70)];
        let record = BreakdownRecord {
            female: Some(female.clone()),
            male: Some(male.clone()),
        };
        let table = BreakdownTable::from_records(std::slice::from_ref(&record));

        for (sex, source) in [(Sex::Female, &female), (Sex::Male, &male)] {
            let expected: i64 = source.iter().filter_map(|b| b.value).sum();
            assert_eq!(table.total(sex), expected);
            assert_eq!(table.columns(sex).ages.len(), source.len());
        }
        assert_eq!(table.total(Sex::Female), 215);
    }

    #[test]
    fn breakdown_of_nothing_is_empty() {
        assert!(BreakdownTable::from_records(&[]).is_empty());
        assert!(BreakdownTable::from_records(&[BreakdownRecord::default()]).is_empty());
    }

    #[test]
    fn breakdown_with_one_side_missing_keeps_the_other() {
        let record = BreakdownRecord {
            female: Some(vec![band("0_to_4", 40)]),
            male: None,
        };
        let table = BreakdownTable::from_records(&[record]);
        assert!(!table.is_empty());
        assert_eq!(table.total(Sex::Female), 40);
        assert!(table.male.is_empty());
    }

    #[test]
    fn region_rows_without_area_are_kept_as_gaps() {
        let mut named = obs("2021-01-01", Some(3), None);
        named.area_name = Some("Leeds".to_string());
        let unnamed = obs("2021-01-01", Some(7), None);
        let table = RegionTable::from_records("2021-01-01", vec![named, unnamed]);
        assert_eq!(table.areas, vec![None, Some("Leeds".to_string())]);
        assert_eq!(table.cases, vec![Some(7), Some(3)]);

        let json = serde_json::to_value(&table).unwrap();
        assert!(json["areas"][0].is_null());
    }
}
