use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{ParserError, Result};
use crate::interpret::client::{LlmClient, LlmRequest, Message, Role};
use crate::interpret::config::InterpreterConfig;
use crate::interpret::json::extract_json_from_response;
use crate::interpret::prompt;
use crate::types::{DecisionNode, SectionId, SpecificOffenseCharacteristic};

const BASE_OFFENSE_KEY: &str = "baseOffenseQuestions";
const SOC_KEY: &str = "specificOffenseCharacteristics";

/// Turns segmented legal text into structured rules.
///
/// Results are not trusted: the caller validates them afterwards.
pub trait Interpreter {
    fn interpret_base_offense(&self, text: &str, section: &SectionId)
        -> Result<Vec<DecisionNode>>;

    fn interpret_soc(
        &self,
        text: &str,
        section: &SectionId,
    ) -> Result<Vec<SpecificOffenseCharacteristic>>;
}

/// [`Interpreter`] backed by a language model.
pub struct LlmInterpreter<C: LlmClient> {
    client: C,
    max_tokens: u32,
    temperature: f64,
}

impl<C: LlmClient> LlmInterpreter<C> {
    pub fn new(client: C, config: &InterpreterConfig) -> Self {
        Self {
            client,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    #[must_use]
    pub fn client(&self) -> &C {
        &self.client
    }

    fn ask<T: DeserializeOwned>(
        &self,
        system: &str,
        user_prompt: String,
        key: &str,
        section: &SectionId,
    ) -> Result<Vec<T>> {
        let request = LlmRequest {
            system: system.to_string(),
            messages: vec![Message {
                role: Role::User,
                content: user_prompt,
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self.client.complete(&request)?;
        debug!(
            %section,
            key,
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "interpretation response"
        );

        let value = extract_json_from_response(&response.content)?;
        let items = take_list(value, key)?;
        info!(%section, key, count = items.len(), "interpreted");
        Ok(items)
    }
}

/// Deserialize the list stored under `key`.
fn take_list<T: DeserializeOwned>(mut value: Value, key: &str) -> Result<Vec<T>> {
    let list = value
        .get_mut(key)
        .map(Value::take)
        .ok_or_else(|| ParserError::InterpretationParse(format!("response has no '{key}' list")))?;

    serde_json::from_value(list)
        .map_err(|e| ParserError::InterpretationParse(format!("malformed '{key}': {e}")))
}

impl<C: LlmClient> Interpreter for LlmInterpreter<C> {
    fn interpret_base_offense(
        &self,
        text: &str,
        section: &SectionId,
    ) -> Result<Vec<DecisionNode>> {
        self.ask(
            prompt::base_offense_system_prompt(),
            prompt::build_base_offense_prompt(section, text),
            BASE_OFFENSE_KEY,
            section,
        )
    }

    fn interpret_soc(
        &self,
        text: &str,
        section: &SectionId,
    ) -> Result<Vec<SpecificOffenseCharacteristic>> {
        self.ask(
            prompt::soc_system_prompt(),
            prompt::build_soc_prompt(section, text),
            SOC_KEY,
            section,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpret::client::test_support::MockLlmClient;
    use crate::types::Branch;
    use pretty_assertions::assert_eq;

    fn interpreter(responses: Vec<&str>) -> LlmInterpreter<MockLlmClient> {
        let config = InterpreterConfig::builder("sk-test").max_tokens(2048).build();
        LlmInterpreter::new(MockLlmClient::with_responses(responses), &config)
    }

    fn section() -> SectionId {
        SectionId::parse("2K2.1").unwrap()
    }

    #[test]
    fn test_interpret_base_offense() {
        let response = r#"Here is the tree:
```json
{"baseOffenseQuestions": [
  {"id": "base_1", "text": "Was a firearm discharged?", "type": "yesno",
   "yesResult": {"baseLevel": 24, "description": "Discharged"},
   "noResult": {"baseLevel": 10, "description": "Otherwise"}}
]}
```"#;
        let interpreter = interpreter(vec![response]);
        let tree = interpreter
            .interpret_base_offense("(a) Base Offense Level", &section())
            .unwrap();

        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].id, "base_1");
        assert_eq!(tree[0].result(Branch::No).and_then(|r| r.base_level), Some(10));

        let requests = interpreter.client().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].max_tokens, 2048);
        assert!(requests[0].system.contains("baseOffenseQuestions"));
        assert_eq!(
            requests[0].messages[0].content,
            "Section: §2K2.1\n\nBase Offense Level Text:\n(a) Base Offense Level"
        );
    }

    #[test]
    fn test_interpret_soc() {
        let response = r#"{"specificOffenseCharacteristics": [
            {"id": "soc_count", "text": "How many?", "type": "select",
             "options": [{"label": "1-2", "adjustment": 0}, {"label": "3-7", "adjustment": 2}]}
        ]}"#;
        let config = InterpreterConfig::builder("sk-test").build();
        let socs = LlmInterpreter::new(MockLlmClient::with_response(response), &config)
            .interpret_soc("(b) Specific Offense Characteristics", &section())
            .unwrap();
        assert_eq!(socs.len(), 1);
        assert_eq!(socs[0].options.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn test_unknown_base_level_is_kept_for_validation() {
        let response = r#"{"baseOffenseQuestions": [
            {"id": "base_1", "text": "Was a firearm discharged?", "type": "yesno",
             "yesResult": {"baseLevel": null, "description": "Level unclear"},
             "noResult": {"description": "Otherwise"}}
        ]}"#;
        let tree = interpreter(vec![response])
            .interpret_base_offense("(a) Base Offense Level", &section())
            .unwrap();

        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].result(Branch::Yes).map(|r| r.base_level), Some(None));
        assert_eq!(tree[0].result(Branch::No).map(|r| r.base_level), Some(None));
        assert_eq!(crate::validator::validate_tree(&tree).len(), 2);
    }

    #[test]
    fn test_missing_key_is_parse_error() {
        let err = interpreter(vec![r#"{"questions": []}"#])
            .interpret_base_offense("text", &section())
            .unwrap_err();
        assert!(matches!(err, ParserError::InterpretationParse(msg) if msg.contains("baseOffenseQuestions")));
    }

    #[test]
    fn test_wrong_shape_is_parse_error() {
        let err = interpreter(vec![r#"{"baseOffenseQuestions": "none"}"#])
            .interpret_base_offense("text", &section())
            .unwrap_err();
        assert!(matches!(err, ParserError::InterpretationParse(_)));
    }

    #[test]
    fn test_client_error_propagates() {
        let config = InterpreterConfig::builder("sk-test").build();
        let client = MockLlmClient::new(vec![Err(ParserError::LlmEmptyResponse)]);
        let err = LlmInterpreter::new(client, &config)
            .interpret_soc("text", &section())
            .unwrap_err();
        assert!(err.is_interpretation_call());
    }
}
