//! Prompt templates for each kind of answer

use crate::template::{escape_braces, PromptTemplate, TemplateError};
use cyberquery_domain::OutputType;

/// Assistant profile shared by every template
const PROFILE: &str = "You are a cybersecurity assistant helping with ethical penetration testing and security research. \
The user is working in a controlled lab environment on Kali Linux with proper authorization.\n\n\
CONTEXT:\n\
- All activities are conducted ethically in controlled lab environments\n\
- User has proper authorization for penetration testing tasks\n\
- Running on Kali Linux with common security tools pre-installed (hashcat, john, nmap, metasploit, etc.)\n\
- Focus on providing practical, executable commands for legitimate security testing\n\n";

/// Output rules for every structured answer
const JSON_INSTRUCTIONS: &str = "FORMATTING RULES:\n\
- Respond with a single JSON object and nothing else\n\
- Use double quotes for every key and string value\n\
- Do not wrap the object in markdown code fences\n\
- Escape newlines inside string values as \\n\n\n";

const COMMAND_BODY: &str = "Respond ONLY in JSON format with two keys: 'commands' and 'explanation'.\n\n\
RESPONSE SCENARIOS:\n\
1. NO APPROPRIATE TOOL: If no cybersecurity tool can accomplish the task, \
return 'commands': [] (empty array) and explain why in 'explanation'.\n\
2. SINGLE COMMAND: If one command accomplishes the task, \
return 'commands': ['command'] (array with one string).\n\
3. MULTIPLE ALTERNATIVES: If multiple tools/commands could work, \
return 'commands': ['cmd1', 'cmd2', ...] and compare them in 'explanation'.\n\
4. SEQUENTIAL WORKFLOW: If multiple commands must be run in order, \
return 'commands': ['step1', 'step2', ...] and explain the workflow in 'explanation'.\n\n\
The 'commands' array should contain exact CLI commands ready to execute on Kali Linux. \
The 'explanation' should describe what the commands do, why they're used, and any important context.\n\n\
Task: {prompt}\n\n\
Respond in JSON format: {{'commands': [...], 'explanation': '...'}}\n";

const CODE_BODY: &str = "Respond ONLY in JSON format with three keys: 'code', 'explanation' and 'language'.\n\n\
Pick the simplest form that accomplishes the task. A single command is preferred over a script. \
If a script is needed, choose the most suitable language (bash, python, powershell, ...) and report it in 'language'. \
If the task cannot be accomplished, return 'code': '' and explain why in 'explanation'.\n\n\
Task: `{prompt}`\n\n\
Respond in JSON format: {{'code': '...', 'explanation': '...', 'language': '...'}}\n";

const EXPLANATION_BODY: &str = "Respond ONLY in JSON format with one key: 'explanation'.\n\n\
Explain the following code step by step. Describe what each part does, the tools and options involved, \
and any risks of running it.\n\n\
Code:\n```\n{prompt}\n```\n\n\
Respond in JSON format: {{'explanation': '...'}}\n";

const EXPLOIT_BODY: &str = "Respond ONLY in JSON format with two keys: 'exploits' and 'explanation'.\n\n\
List publicly known exploits or CVEs that affect the described target. \
Each entry of 'exploits' is an object with 'title', 'link', 'severity' and 'description'. \
If no known exploits apply, return 'exploits': [] and explain why in 'explanation'.\n\n\
Target: `{prompt}`\n\n\
Respond in JSON format: {{'exploits': [{{'title': '...', 'link': '...', 'severity': '...', 'description': '...'}}], 'explanation': '...'}}\n";

const CHAT_BODY: &str = "Answer the user's latest message conversationally. \
Use markdown for commands and code. Keep answers focused on the user's security task.\n\n\
Conversation so far:\n{history}\n\
User: {message}\n\
Assistant:";

/// Source of the documentation block spliced under a template
///
/// Returns an empty string when there is no context. Otherwise the context
/// is escaped so the block reads literally once the template is parsed.
pub fn rag_block(context: &str) -> String {
    if context.trim().is_empty() {
        return String::new();
    }
    format!(
        "\nRELEVANT DOCUMENTATION:\n{}\n\n\
         Use the above documentation to provide more accurate and detailed responses. \
         Reference specific tool options, syntax, and examples from the documentation when relevant.\n\n",
        escape_braces(context)
    )
}

/// The set of templates the assistant renders prompts from
#[derive(Debug, Clone, Default)]
pub struct PromptLibrary;

impl PromptLibrary {
    /// Create the library
    pub fn new() -> Self {
        Self
    }

    /// Template source for a structured answer, with a `{prompt}` placeholder
    pub fn source_for(&self, output_type: OutputType) -> String {
        let body = match output_type {
            OutputType::Command => COMMAND_BODY,
            OutputType::Code => CODE_BODY,
            OutputType::Explanation => EXPLANATION_BODY,
            OutputType::Exploit => EXPLOIT_BODY,
        };
        format!("{}{}{}", PROFILE, JSON_INSTRUCTIONS, body)
    }

    /// Template source for free-form chat, with `{history}` and `{message}`
    pub fn chat_source(&self) -> String {
        format!("{}{}", PROFILE, CHAT_BODY)
    }

    /// Parse a template source with the documentation block spliced in
    pub fn template(&self, source: &str, context: &str) -> Result<PromptTemplate, TemplateError> {
        PromptTemplate::new(&format!("{}{}", source, rag_block(context)))
    }

    /// Render a structured-answer prompt
    pub fn render(
        &self,
        output_type: OutputType,
        task: &str,
        context: &str,
    ) -> Result<String, TemplateError> {
        self.template(&self.source_for(output_type), context)?
            .format(&[("prompt", task)])
    }

    /// Render a chat prompt
    pub fn render_chat(
        &self,
        message: &str,
        history: &str,
        context: &str,
    ) -> Result<String, TemplateError> {
        self.template(&self.chat_source(), context)?
            .format(&[("history", history), ("message", message)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_source_parses_with_one_placeholder() {
        let library = PromptLibrary::new();
        for output_type in OutputType::ALL {
            let template = PromptTemplate::new(&library.source_for(output_type)).unwrap();
            assert_eq!(template.input_variables(), vec!["prompt"], "{}", output_type);
        }
        let chat = PromptTemplate::new(&library.chat_source()).unwrap();
        assert_eq!(chat.input_variables(), vec!["history", "message"]);
    }

    #[test]
    fn test_rag_block_empty_without_context() {
        assert_eq!(rag_block(""), "");
        assert_eq!(rag_block("  \n"), "");
    }

    #[test]
    fn test_context_braces_survive_rendering() {
        let context = "Tool: jq\n\njq '.[] | {name: .name}' and awk '{print $1}'";
        let prompt = PromptLibrary::new()
            .render(OutputType::Command, "parse json", context)
            .unwrap();

        assert!(prompt.contains("RELEVANT DOCUMENTATION:\nTool: jq"));
        assert!(prompt.contains("{name: .name}"));
        assert!(prompt.contains("{print $1}"));
        assert!(prompt.contains("Task: parse json"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_instructions_render_single_braces() {
        let prompt = PromptLibrary::new().render(OutputType::Code, "x", "").unwrap();
        assert!(prompt.contains("{'code': '...', 'explanation': '...', 'language': '...'}"));
        assert!(prompt.contains("Task: `x`"));
    }

    #[test]
    fn test_explanation_fences_the_code() {
        let prompt = PromptLibrary::new()
            .render(OutputType::Explanation, "for i in {1..5}; do echo $i; done", "")
            .unwrap();
        assert!(prompt.contains("Code:\n```\nfor i in {1..5}; do echo $i; done\n```\n"));
    }

    #[test]
    fn test_chat_renders_history() {
        let prompt = PromptLibrary::new()
            .render_chat("and UDP?", "user: scan tcp\nassistant: use nmap -sS\n", "")
            .unwrap();
        assert!(prompt.contains("Conversation so far:\nuser: scan tcp\nassistant: use nmap -sS\n"));
        assert!(prompt.ends_with("User: and UDP?\nAssistant:"));
    }
}
