use chrono::{NaiveTime, Timelike};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

/// Upper bound for token lifetime (one year)
const MAX_JWT_EXPIRY_HOURS: u64 = 24 * 365;
const MINUTES_PER_DAY: i64 = 24 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub attendance: AttendanceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub cors_origins: Vec<String>,
    pub min_password_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceConfig {
    /// Start of the working day in the organization's local time.
    pub workday_start: NaiveTime,
    /// Check-ins up to this many minutes after `workday_start` still count as present.
    pub late_grace_minutes: i64,
    /// Offset of the local time zone from UTC, in minutes.
    pub utc_offset_minutes: i32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
        .clamped()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(port) = env::var("WORKHUB_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse().ok())
        {
            self.server.port = port;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // API overrides
        if let Ok(v) = env::var("API_DEFAULT_PAGE_SIZE") {
            self.api.default_page_size = v.parse().unwrap_or(self.api.default_page_size);
        }
        if let Ok(v) = env::var("API_MAX_PAGE_SIZE") {
            self.api.max_page_size = v.parse().unwrap_or(self.api.max_page_size);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURITY_MIN_PASSWORD_LENGTH") {
            self.security.min_password_length = v.parse().unwrap_or(self.security.min_password_length);
        }

        // Attendance overrides
        if let Ok(v) = env::var("ATTENDANCE_WORKDAY_START") {
            self.attendance.workday_start =
                NaiveTime::parse_from_str(&v, "%H:%M").unwrap_or(self.attendance.workday_start);
        }
        if let Ok(v) = env::var("ATTENDANCE_LATE_GRACE_MINUTES") {
            self.attendance.late_grace_minutes = v.parse().unwrap_or(self.attendance.late_grace_minutes);
        }
        if let Ok(v) = env::var("ATTENDANCE_UTC_OFFSET_MINUTES") {
            self.attendance.utc_offset_minutes = v.parse().unwrap_or(self.attendance.utc_offset_minutes);
        }

        self
    }

    /// Keep overridden values inside the ranges the rest of the service relies on
    fn clamped(mut self) -> Self {
        self.security.jwt_expiry_hours = self.security.jwt_expiry_hours.clamp(1, MAX_JWT_EXPIRY_HOURS);

        // The late threshold must stay on the same day as the workday start
        let start_minute = (self.attendance.workday_start.num_seconds_from_midnight() / 60) as i64;
        let until_midnight = MINUTES_PER_DAY - 1 - start_minute;
        self.attendance.late_grace_minutes = self.attendance.late_grace_minutes.clamp(0, until_midnight);
        self.attendance.utc_offset_minutes = self
            .attendance
            .utc_offset_minutes
            .clamp(-(MINUTES_PER_DAY as i32 - 1), MINUTES_PER_DAY as i32 - 1);

        self.api.max_page_size = self.api.max_page_size.max(1);
        self.api.default_page_size = self.api.default_page_size.clamp(1, self.api.max_page_size);
        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            api: ApiConfig {
                default_page_size: 50,
                max_page_size: 200,
            },
            security: SecurityConfig {
                jwt_secret: "workhub-development-secret".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                min_password_length: 6,
            },
            attendance: AttendanceConfig::default(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
                run_migrations: true,
            },
            api: ApiConfig {
                default_page_size: 50,
                max_page_size: 200,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                cors_origins: vec!["https://staging.example.com".to_string()],
                min_password_length: 8,
            },
            attendance: AttendanceConfig::default(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
            },
            api: ApiConfig {
                default_page_size: 25,
                max_page_size: 100,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 12,
                cors_origins: vec!["https://app.example.com".to_string()],
                min_password_length: 10,
            },
            attendance: AttendanceConfig::default(),
        }
    }
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            workday_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            late_grace_minutes: 10,
            utc_offset_minutes: 0,
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}
