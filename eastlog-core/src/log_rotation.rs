use std::{
    convert::Infallible,
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use chrono::{DateTime, TimeZone};

/// How often the active log file changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
    /// `app-YYYY-MM-DD.log`
    Daily,
    /// `app-YYYY-MM.log`
    Month,
    /// `app-YYYY.log`
    Year,
    /// `app.log`
    #[default]
    None,
}

impl Rotation {
    pub fn as_str(self) -> &'static str {
        match self {
            Rotation::Daily => "daily",
            Rotation::Month => "month",
            Rotation::Year => "year",
            Rotation::None => "none",
        }
    }

    /// File name of the bucket `date` falls into.
    pub fn file_name<Tz: TimeZone>(self, date: &DateTime<Tz>) -> String
    where
        Tz::Offset: fmt::Display,
    {
        match self {
            Rotation::Daily => format!("app-{}.log", date.format("%Y-%m-%d")),
            Rotation::Month => format!("app-{}.log", date.format("%Y-%m")),
            Rotation::Year => format!("app-{}.log", date.format("%Y")),
            Rotation::None => "app.log".to_string(),
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rotation {
    type Err = Infallible;

    /// Unrecognised modes mean no rotation.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "daily" => Rotation::Daily,
            "month" => Rotation::Month,
            "year" => Rotation::Year,
            _ => Rotation::None,
        })
    }
}

impl From<&str> for Rotation {
    fn from(s: &str) -> Self {
        let Ok(rotation) = s.parse::<Rotation>();
        rotation
    }
}

/// Directory holding the files of `application`.
pub fn log_directory(root: &Path, application: &str) -> PathBuf {
    root.join(application)
}

/// Full path of the file a record written at `date` is appended to.
pub fn target_path<Tz: TimeZone>(
    root: &Path,
    application: &str,
    rotation: Rotation,
    date: &DateTime<Tz>,
) -> PathBuf
where
    Tz::Offset: fmt::Display,
{
    log_directory(root, application).join(rotation.file_name(date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeDelta};

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, h, 0, 0).single().unwrap()
    }

    #[test]
    fn test_file_names() {
        let date = at(2024, 3, 5, 10);
        assert_eq!(Rotation::Daily.file_name(&date), "app-2024-03-05.log");
        assert_eq!(Rotation::Month.file_name(&date), "app-2024-03.log");
        assert_eq!(Rotation::Year.file_name(&date), "app-2024.log");
        assert_eq!(Rotation::None.file_name(&date), "app.log");
    }

    #[test]
    fn test_parse_rotation() {
        assert_eq!("daily".parse::<Rotation>(), Ok(Rotation::Daily));
        assert_eq!(Rotation::from("month"), Rotation::Month);
        assert_eq!(Rotation::from("year"), Rotation::Year);
        for other in ["", "none", "weekly", "DAILY", "hourly"] {
            assert_eq!(Rotation::from(other), Rotation::None, "{other}");
        }
        assert_eq!(Rotation::default(), Rotation::None);
        assert_eq!(Rotation::Month.to_string(), "month");
    }

    #[test]
    fn test_target_path_layout() {
        let path = target_path(Path::new("/tmp/logs"), "web", Rotation::Daily, &at(2024, 3, 5, 10));
        assert_eq!(path, PathBuf::from("/tmp/logs/web/app-2024-03-05.log"));
    }

    #[test]
    fn test_same_bucket_same_path() {
        let root = Path::new("/var/log");
        let cases = [
            (Rotation::Daily, at(2024, 3, 5, 1), at(2024, 3, 5, 23)),
            (Rotation::Month, at(2024, 3, 1, 1), at(2024, 3, 31, 23)),
            (Rotation::Year, at(2024, 1, 1, 1), at(2024, 12, 31, 23)),
            (Rotation::None, at(2020, 1, 1, 1), at(2024, 12, 31, 23)),
        ];
        for (rotation, first, second) in cases {
            assert_eq!(
                target_path(root, "api", rotation, &first),
                target_path(root, "api", rotation, &second),
                "{rotation}"
            );
        }
    }

    #[test]
    fn test_different_bucket_different_path() {
        let root = Path::new("/var/log");
        let cases = [
            (Rotation::Daily, at(2024, 3, 5, 23), at(2024, 3, 6, 1)),
            (Rotation::Month, at(2024, 3, 31, 23), at(2024, 4, 1, 1)),
            (Rotation::Year, at(2024, 12, 31, 23), at(2025, 1, 1, 1)),
        ];
        for (rotation, first, second) in cases {
            assert_ne!(
                target_path(root, "api", rotation, &first),
                target_path(root, "api", rotation, &second),
                "{rotation}"
            );
        }
    }

    #[test]
    fn test_year_rotation_eight_months_apart() {
        let first = at(2024, 9, 15, 12);
        let second = first + TimeDelta::days(8 * 30);
        assert_eq!(Rotation::Year.file_name(&first), "app-2024.log");
        assert_eq!(Rotation::Year.file_name(&second), "app-2025.log");
    }
}
