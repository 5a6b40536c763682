//! Bounded retry over a yes/no (or any spoken) question.

use crate::error::Result;

/// Ask up to `max_attempts` times, speaking `reprompt` between attempts.
///
/// A reprompt only plays between two attempts, never after the last one: an
/// answer on attempt k costs k-1 reprompts, and exhaustion costs
/// `max_attempts - 1`. Returns None when every attempt came back empty.
pub fn retry<T, A, R>(max_attempts: u32, mut ask: A, mut reprompt: R) -> Result<Option<T>>
where
    A: FnMut() -> Result<Option<T>>,
    R: FnMut() -> Result<()>,
{
    for attempt in 1..=max_attempts {
        if let Some(answer) = ask()? {
            return Ok(Some(answer));
        }
        if attempt < max_attempts {
            reprompt()?;
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnswerboxError;

    #[test]
    fn first_attempt_success_skips_reprompts() {
        let mut reprompts = 0;
        let answer = retry(3, || Ok(Some("yes")), || {
            reprompts += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(answer, Some("yes"));
        assert_eq!(reprompts, 0);
    }

    #[test]
    fn success_on_attempt_k_costs_k_minus_one_reprompts() {
        let mut asks = 0;
        let mut reprompts = 0;
        let answer = retry(
            4,
            || {
                asks += 1;
                Ok(if asks == 3 { Some("no") } else { None })
            },
            || {
                reprompts += 1;
                Ok(())
            },
        )
        .unwrap();
        assert_eq!(answer, Some("no"));
        assert_eq!(asks, 3);
        assert_eq!(reprompts, 2);
    }

    #[test]
    fn exhaustion_never_reprompts_after_the_last_attempt() {
        let mut asks = 0;
        let mut reprompts = 0;
        let answer: Option<&str> = retry(
            3,
            || {
                asks += 1;
                Ok(None)
            },
            || {
                reprompts += 1;
                Ok(())
            },
        )
        .unwrap();
        assert!(answer.is_none());
        assert_eq!(asks, 3);
        assert_eq!(reprompts, 2);
    }

    #[test]
    fn ask_error_aborts_immediately() {
        let mut reprompts = 0;
        let result: Result<Option<()>> = retry(
            3,
            || Err(AnswerboxError::Other("microphone gone".to_string())),
            || {
                reprompts += 1;
                Ok(())
            },
        );
        assert!(result.is_err());
        assert_eq!(reprompts, 0);
    }
}
