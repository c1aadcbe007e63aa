use std::borrow::Cow;

use log::debug;
use redis::aio::ConnectionLike;
use serde_json::Value;

use crate::{
    errors::{RepoError, ValidationError},
    runtime::{
        commands::{MutationCommand, MutationPlan},
        scripts::{COMMENT_MUTATION_SCRIPT, EDGE_MUTATION_SCRIPT, ENTITY_MUTATION_SCRIPT, POST_MUTATION_SCRIPT},
    },
};

pub async fn execute_plan<C>(conn: &mut C, plan: &MutationPlan) -> Result<Vec<Value>, RepoError>
where
    C: ConnectionLike + Send,
{
    let mut responses = Vec::with_capacity(plan.commands.len());

    for command in &plan.commands {
        let script = match command {
            MutationCommand::CreateUser(_) | MutationCommand::UpdateEntity(_) => &*ENTITY_MUTATION_SCRIPT,
            MutationCommand::Follow(_) | MutationCommand::Unfollow(_) => &*EDGE_MUTATION_SCRIPT,
            MutationCommand::CreatePost(_) | MutationCommand::DeletePost(_) | MutationCommand::Like(_) => {
                &*POST_MUTATION_SCRIPT
            }
            MutationCommand::CreateComment(_) | MutationCommand::DeleteComment(_) => &*COMMENT_MUTATION_SCRIPT,
        };

        let payload = serde_json::to_string(command).map_err(|err| RepoError::Other {
            message: Cow::Owned(format!("failed to serialize command: {err}")),
        })?;
        debug!("executing mutation {payload}");

        let mut invocation = script.prepare_invoke();
        invocation.arg(payload);
        let raw: String = invocation.invoke_async(conn).await.map_err(RepoError::from)?;

        responses.push(interpret_response(&raw)?);
    }

    Ok(responses)
}

/// Maps a script's JSON reply onto either the reply itself or the matching [`RepoError`].
pub fn interpret_response(raw: &str) -> Result<Value, RepoError> {
    let value: Value = serde_json::from_str(raw).map_err(|err| RepoError::Other {
        message: Cow::Owned(format!("failed to parse lua response: {err}")),
    })?;

    let Some(error) = value.get("error") else {
        return Ok(value);
    };
    let Some(code) = error.as_str() else {
        return Err(RepoError::Other {
            message: Cow::Borrowed("lua_error"),
        });
    };

    let string_field = |name: &str| value.get(name).and_then(|v| v.as_str()).map(|s| s.to_string());
    let string_list = |name: &str| -> Vec<String> {
        value
            .get(name)
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    };

    Err(match code {
        "version_conflict" => RepoError::VersionConflict {
            expected: value.get("expected").and_then(|v| v.as_u64()),
            actual: value.get("actual").and_then(|v| v.as_u64()),
        },
        "entity_not_found" => RepoError::NotFound {
            entity_id: string_field("entity_id"),
        },
        "unique_constraint_violation" => RepoError::UniqueConstraintViolation {
            fields: string_list("fields"),
            values: string_list("values"),
            existing_entity_id: string_field("existing_entity_id").unwrap_or_default(),
        },
        "forbidden" => RepoError::Forbidden {
            action: Cow::Owned(string_field("action").unwrap_or_else(|| "mutation".to_string())),
        },
        "self_follow" => {
            RepoError::Validation(ValidationError::single("followingId", "self_follow", "users cannot follow themselves"))
        }
        other => RepoError::Other {
            message: Cow::Owned(other.to_string()),
        },
    })
}

#[allow(async_fn_in_trait)]
pub trait MutationExecutor {
    async fn execute(&mut self, plan: MutationPlan) -> Result<Vec<Value>, RepoError>;
}

pub struct RedisExecutor<'a, C>
where
    C: ConnectionLike + Send,
{
    connection: &'a mut C,
}

impl<'a, C> RedisExecutor<'a, C>
where
    C: ConnectionLike + Send,
{
    pub fn new(connection: &'a mut C) -> Self {
        Self { connection }
    }
}

impl<C> MutationExecutor for RedisExecutor<'_, C>
where
    C: ConnectionLike + Send,
{
    async fn execute(&mut self, plan: MutationPlan) -> Result<Vec<Value>, RepoError> {
        execute_plan(self.connection, &plan).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_replies_pass_through() {
        let value = interpret_response(r#"{"ok":true,"created":false}"#).unwrap();
        assert_eq!(value["created"], Value::Bool(false));
    }

    #[test]
    fn not_found_carries_entity_id() {
        match interpret_response(r#"{"error":"entity_not_found","entity_id":"p1"}"#) {
            Err(RepoError::NotFound { entity_id }) => assert_eq!(entity_id.as_deref(), Some("p1")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unique_violation_is_decoded() {
        let raw = r#"{"error":"unique_constraint_violation","fields":["email"],"values":["a@b.c"],"existing_entity_id":"u9"}"#;
        match interpret_response(raw) {
            Err(RepoError::UniqueConstraintViolation {
                fields,
                values,
                existing_entity_id,
            }) => {
                assert_eq!(fields, ["email"]);
                assert_eq!(values, ["a@b.c"]);
                assert_eq!(existing_entity_id, "u9");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn version_conflict_reports_both_versions() {
        match interpret_response(r#"{"error":"version_conflict","expected":2,"actual":3}"#) {
            Err(RepoError::VersionConflict { expected, actual }) => {
                assert_eq!(expected, Some(2));
                assert_eq!(actual, Some(3));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn forbidden_and_self_follow_map_to_client_errors() {
        let err = interpret_response(r#"{"error":"forbidden","action":"delete comment"}"#).unwrap_err();
        assert_eq!(err.reason(), "forbidden");
        match interpret_response(r#"{"error":"self_follow"}"#) {
            Err(RepoError::Validation(err)) => assert!(err.has_code("self_follow")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_and_malformed_replies_are_internal() {
        assert_eq!(interpret_response(r#"{"error":"boom"}"#).unwrap_err().reason(), "internal");
        assert_eq!(interpret_response(r#"{"error":5}"#).unwrap_err().reason(), "internal");
        assert_eq!(interpret_response("not json").unwrap_err().reason(), "internal");
    }
}
