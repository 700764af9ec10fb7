use serde_json::{json, Value};

use crate::error::ApiError;
use crate::params::Params;

use super::fields::list;
use super::plan::{Call, Plan};
use super::OperationSpec;

pub(super) const OPERATIONS: &[OperationSpec] = &[
    OperationSpec::new("get", &["playbookId"], get),
    OperationSpec::new("getAll", &[], get_all),
    OperationSpec::new("getQuestions", &["playbookId"], get_questions),
    OperationSpec::new("getAnswerOptions", &["playbookId", "questionId"], get_answer_options),
    OperationSpec::new("simulate", &["playbookId"], simulate),
];

fn playbook(p: &Params) -> Result<String, ApiError> {
    Ok(format!("/playbooks/{}", p.segment("playbookId")?))
}

fn get(p: &Params) -> Result<Plan, ApiError> {
    Ok(Call::get(playbook(p)?).into())
}

fn get_all(p: &Params) -> Result<Plan, ApiError> {
    list(p, "/playbooks", "filters")
}

fn get_questions(p: &Params) -> Result<Plan, ApiError> {
    Ok(Call::get(format!("{}/questions", playbook(p)?))
        .data_or_response()
        .into())
}

fn get_answer_options(p: &Params) -> Result<Plan, ApiError> {
    Ok(Call::get(format!(
        "{}/questions/{}/options",
        playbook(p)?,
        p.segment("questionId")?
    ))
    .data_or_response()
    .into())
}

fn simulate(p: &Params) -> Result<Plan, ApiError> {
    let answers = p.collection("answers")?;
    let answers: Vec<Value> = answers
        .get("answerValues")
        .and_then(Value::as_array)
        .map(|values| values.iter().map(answer).collect())
        .unwrap_or_default();

    let mut body = serde_json::Map::new();
    body.insert("answers".to_string(), Value::Array(answers));
    Ok(Call::post(format!("{}/simulate", playbook(p)?)).body(body).into())
}

/// A comma in the answer turns it into a multi-select list.
fn answer(entry: &Value) -> Value {
    let text = entry.get("answerValue").and_then(Value::as_str).unwrap_or_default();
    let value = if text.contains(',') {
        Value::from(text.split(',').map(str::trim).collect::<Vec<_>>())
    } else {
        Value::from(text)
    };
    json!({ "question_id": entry.get("questionId"), "answer_value": value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulate_splits_multi_select_answers() {
        let params = Params::from_value(json!({
            "playbookId": "pb_1",
            "answers": { "answerValues": [
                { "questionId": "seats", "answerValue": "25" },
                { "questionId": "addons", "answerValue": "sso, audit ,support" }
            ] }
        }));
        let Plan::Call(call) = simulate(&params).unwrap() else {
            panic!("expected call");
        };
        assert_eq!(call.path, "/playbooks/pb_1/simulate");
        assert_eq!(
            Value::Object(call.body.unwrap()),
            json!({ "answers": [
                { "question_id": "seats", "answer_value": "25" },
                { "question_id": "addons", "answer_value": ["sso", "audit", "support"] }
            ] })
        );
    }

    #[test]
    fn simulate_without_answers_sends_empty_list() {
        let Plan::Call(call) = simulate(&Params::from_value(json!({ "playbookId": "pb_1" }))).unwrap()
        else {
            panic!("expected call");
        };
        assert_eq!(call.body.unwrap()["answers"], json!([]));
    }

    #[test]
    fn answer_options_path() {
        let params = Params::from_value(json!({ "playbookId": "pb_1", "questionId": "q9" }));
        let Plan::Call(call) = get_answer_options(&params).unwrap() else {
            panic!("expected call");
        };
        assert_eq!(call.path, "/playbooks/pb_1/questions/q9/options");
    }
}
