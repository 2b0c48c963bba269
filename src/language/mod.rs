//! Supported languages: wire ids, editor syntax ids and default templates.

use std::{fmt, str::FromStr};

use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "py")]
    Python,
    #[serde(rename = "cpp")]
    Cpp,
    #[serde(rename = "java")]
    Java,
    #[serde(rename = "js")]
    JavaScript,
    #[serde(rename = "go")]
    Go,
}

impl Language {
    /// All languages in selector order.
    pub const ALL: [Language; 5] = [
        Language::Python,
        Language::Cpp,
        Language::Java,
        Language::JavaScript,
        Language::Go,
    ];

    /// Identifier the execution service expects in the `language` field.
    pub fn wire_id(self) -> &'static str {
        match self {
            Language::Python => "py",
            Language::Cpp => "cpp",
            Language::Java => "java",
            Language::JavaScript => "js",
            Language::Go => "go",
        }
    }

    /// Syntax-highlighting identifier for editor widgets.
    pub fn syntax_id(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Cpp => "cpp",
            Language::Java => "java",
            Language::JavaScript => "javascript",
            Language::Go => "go",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::Cpp => "C++",
            Language::Java => "Java",
            Language::JavaScript => "JavaScript",
            Language::Go => "Go",
        }
    }

    /// Source shown when the language is selected.
    pub fn template(self) -> &'static str {
        match self {
            Language::Python => "# Write your Python code here\nprint(\"Hello, World!\")",
            Language::Cpp => concat!(
                "// Write your C++ code here\n",
                "#include <iostream>\n",
                "\n",
                "int main() {\n",
                "    std::cout << \"Hello, World!\" << std::endl;\n",
                "    return 0;\n",
                "}"
            ),
            Language::Java => concat!(
                "// Write your Java code here\n",
                "public class Main {\n",
                "    public static void main(String[] args) {\n",
                "        System.out.println(\"Hello, World!\");\n",
                "    }\n",
                "}"
            ),
            Language::JavaScript => {
                "// Write your JavaScript code here\nconsole.log(\"Hello, World!\");"
            }
            Language::Go => concat!(
                "// Write your Go code here\n",
                "package main\n",
                "\n",
                "import \"fmt\"\n",
                "\n",
                "func main() {\n",
                "    fmt.Println(\"Hello, World!\")\n",
                "}"
            ),
        }
    }

    /// Next language in selector order, wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|l| *l == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|l| *l == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Language {
    type Err = Error;

    /// Accepts the wire id, the syntax id or the display name, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|l| {
                needle.eq_ignore_ascii_case(l.wire_id())
                    || needle.eq_ignore_ascii_case(l.syntax_id())
                    || needle.eq_ignore_ascii_case(l.display_name())
            })
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|l| l.wire_id()).collect();
                anyhow!("Unsupported language: {}. Supported: {}", needle, known.join(", "))
            })
    }
}
