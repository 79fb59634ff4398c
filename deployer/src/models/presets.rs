//! Application type presets
//!
//! Static defaults used to pre-populate a request before submission.

use serde::{Deserialize, Serialize};

/// Known application types
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppType {
    #[default]
    Node,
    React,
    Nextjs,
    Flask,
    Go,
    Java,
    Vite,
}

/// Default commands and port for an application type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preset {
    pub install_cmd: &'static str,
    pub build_cmd: &'static str,
    pub start_cmd: &'static str,
    pub port: u16,
    pub notes: &'static str,
}

impl AppType {
    pub const ALL: [AppType; 7] = [
        AppType::Node,
        AppType::React,
        AppType::Nextjs,
        AppType::Flask,
        AppType::Go,
        AppType::Java,
        AppType::Vite,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppType::Node => "node",
            AppType::React => "react",
            AppType::Nextjs => "nextjs",
            AppType::Flask => "flask",
            AppType::Go => "go",
            AppType::Java => "java",
            AppType::Vite => "vite",
        }
    }

    pub fn preset(&self) -> Preset {
        match self {
            AppType::Node => Preset {
                install_cmd: "npm install",
                build_cmd: "",
                start_cmd: "npm start",
                port: 3000,
                notes: "Standard Node.js application with npm",
            },
            AppType::React => Preset {
                install_cmd: "npm install",
                build_cmd: "npm run build",
                start_cmd: "npm start",
                port: 3000,
                notes: "Create React App setup",
            },
            AppType::Nextjs => Preset {
                install_cmd: "npm install",
                build_cmd: "npm run build",
                start_cmd: "npm start",
                port: 3000,
                notes: "Next.js application (ensure output is 'standalone' for optimal deployment)",
            },
            AppType::Flask => Preset {
                install_cmd: "pip install -r requirements.txt",
                build_cmd: "",
                start_cmd: "python app.py",
                port: 5000,
                notes: "Flask applications require a WSGI server like Gunicorn for production",
            },
            AppType::Go => Preset {
                install_cmd: "go mod download",
                build_cmd: "go build",
                start_cmd: "./app",
                port: 8080,
                notes: "Go applications should build a single binary",
            },
            AppType::Java => Preset {
                install_cmd: "mvn install",
                build_cmd: "mvn package",
                start_cmd: "java -jar target/*.jar",
                port: 8080,
                notes: "Standard Spring Boot application",
            },
            AppType::Vite => Preset {
                install_cmd: "npm install",
                build_cmd: "npm run build",
                start_cmd: "npx serve dist",
                port: 3000,
                notes: "Vite applications are served from the build output",
            },
        }
    }
}

impl std::fmt::Display for AppType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AppType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AppType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let known: Vec<&str> = AppType::ALL.iter().map(AppType::as_str).collect();
                format!("Unknown application type: {} (expected one of {})", s, known.join(", "))
            })
    }
}
