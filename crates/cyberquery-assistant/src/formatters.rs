//! Conversational rendering of typed answers

use crate::types::{
    CodeExplanationResponse, CodeGenerationResponse, CommandGenerationResponse,
    ExploitSearchResponse,
};

/// Renders typed answers as markdown chat replies
pub struct ResponseFormatter;

impl ResponseFormatter {
    /// Code answer; single-line code reads as a command, multi-line as a script
    pub fn format_code_generation(response: &CodeGenerationResponse) -> String {
        if response.code.is_empty() {
            return format!("I couldn't generate code for this task. {}", response.explanation);
        }

        let header = if response.code.contains('\n') {
            format!("I've written a {} script for you:", response.language)
        } else {
            "Here's the command you can use:".to_string()
        };

        format!(
            "{}\n\n```{}\n{}\n```\n\n**Explanation**: {}",
            header, response.language, response.code, response.explanation
        )
    }

    /// Command answer as a numbered list
    pub fn format_command_generation(response: &CommandGenerationResponse) -> String {
        match response.commands.as_slice() {
            [] => format!("No suitable command found. {}", response.explanation),
            [command] => format!(
                "Here's the command you can use:\n\n```bash\n{}\n```\n\n**Explanation**: {}",
                command, response.explanation
            ),
            commands => {
                let numbered: Vec<String> = commands
                    .iter()
                    .enumerate()
                    .map(|(i, command)| format!("{}. `{}`", i + 1, command))
                    .collect();
                format!(
                    "Here are the commands you can use:\n\n{}\n\n**Explanation**: {}",
                    numbered.join("\n"),
                    response.explanation
                )
            }
        }
    }

    /// Explanation answer; `context` names what was explained, e.g. `code`
    pub fn format_explanation(response: &CodeExplanationResponse, context: &str) -> String {
        format!("Let me explain this {}:\n\n{}", context, response.explanation)
    }

    /// Exploit answer with one section per exploit
    pub fn format_exploit_search(response: &ExploitSearchResponse) -> String {
        if response.exploits.is_empty() {
            return format!("No exploits found. {}", response.explanation);
        }

        let sections: Vec<String> = response
            .exploits
            .iter()
            .map(|exploit| {
                format!(
                    "### {} ({})\n**Description**: {}\n**Link**: {}\n",
                    exploit.title, exploit.severity, exploit.description, exploit.link
                )
            })
            .collect();

        let count = response.exploits.len();
        let noun = if count == 1 { "vulnerability" } else { "vulnerabilities" };

        format!(
            "I found {} {}:\n\n{}\n**Summary**: {}",
            count,
            noun,
            sections.join("\n"),
            response.explanation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Exploit;

    fn code(code: &str) -> CodeGenerationResponse {
        CodeGenerationResponse {
            code: code.to_string(),
            explanation: "Does the thing".to_string(),
            language: "bash".to_string(),
        }
    }

    #[test]
    fn test_single_line_code_is_a_command() {
        assert_eq!(
            ResponseFormatter::format_code_generation(&code("nmap -sn 10.0.0.0/24")),
            "Here's the command you can use:\n\n```bash\nnmap -sn 10.0.0.0/24\n```\n\n**Explanation**: Does the thing"
        );
    }

    #[test]
    fn test_multi_line_code_is_a_script() {
        let out = ResponseFormatter::format_code_generation(&code("for h in a b; do\n  ping -c1 $h\ndone"));
        assert!(out.starts_with("I've written a bash script for you:\n\n```bash\nfor h"));
    }

    #[test]
    fn test_empty_code() {
        assert_eq!(
            ResponseFormatter::format_code_generation(&code("")),
            "I couldn't generate code for this task. Does the thing"
        );
    }

    #[test]
    fn test_numbered_commands() {
        let response = CommandGenerationResponse {
            commands: vec!["nmap -sS t".to_string(), "nmap -sU t".to_string()],
            explanation: "TCP then UDP".to_string(),
        };
        let out = ResponseFormatter::format_command_generation(&response);
        assert!(out.contains("1. `nmap -sS t`\n2. `nmap -sU t`"));
        assert!(out.ends_with("**Explanation**: TCP then UDP"));
    }

    #[test]
    fn test_explanation() {
        let response = CodeExplanationResponse {
            explanation: "It lists files.".to_string(),
        };
        assert_eq!(
            ResponseFormatter::format_explanation(&response, "command"),
            "Let me explain this command:\n\nIt lists files."
        );
    }

    #[test]
    fn test_exploits() {
        let exploit = Exploit {
            title: "EternalBlue".to_string(),
            link: "https://example.org/ms17-010".to_string(),
            severity: "Critical".to_string(),
            description: "SMBv1 RCE".to_string(),
        };
        let mut response = ExploitSearchResponse {
            exploits: vec![exploit.clone()],
            explanation: "Patch it".to_string(),
        };
        assert_eq!(
            ResponseFormatter::format_exploit_search(&response),
            "I found 1 vulnerability:\n\n### EternalBlue (Critical)\n**Description**: SMBv1 RCE\n**Link**: https://example.org/ms17-010\n\n**Summary**: Patch it"
        );

        response.exploits.push(exploit);
        assert!(ResponseFormatter::format_exploit_search(&response).starts_with("I found 2 vulnerabilities:"));

        response.exploits.clear();
        assert_eq!(
            ResponseFormatter::format_exploit_search(&response),
            "No exploits found. Patch it"
        );
    }
}
