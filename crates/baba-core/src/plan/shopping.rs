//! Shopping-list consolidation with a flat-list fallback.
//!
//! The aggregation call groups items by category and merges duplicate
//! quantities where units are compatible. The merge is best-effort and
//! approximate -- never a verified total. Any failure falls back to an
//! uncategorized newline-joined list of the raw ingredient strings.

use std::collections::BTreeMap;

use anyhow::{Result, bail};

use crate::ai::{ConsolidatedList, RecipeAi};

/// Consolidate the collected ingredient strings into a shopping list.
///
/// An empty input list is rejected before the upstream call; everything
/// else succeeds, via the flat fallback if consolidation fails.
pub async fn consolidate_ingredients(ai: &dyn RecipeAi, items: &[String]) -> Result<String> {
    if items.is_empty() {
        bail!("cannot consolidate an empty ingredient list");
    }

    match ai.consolidate_list(items).await {
        Ok(ConsolidatedList::Categorized(categories)) => Ok(render_categorized(&categories)),
        Ok(ConsolidatedList::Flat(list)) => Ok(list),
        Err(e) => {
            tracing::warn!(error = %e, "shopping list consolidation failed, using flat fallback");
            Ok(flat_fallback(items))
        }
    }
}

/// Render a category map as upper-cased sections, categories in sorted
/// order.
pub fn render_categorized(categories: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (category, block) in categories {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(&category.to_uppercase());
        out.push_str(":\n");
        out.push_str(block.trim_end());
    }
    out
}

/// The uncategorized fallback: raw ingredient strings, newline-joined.
pub fn flat_fallback(items: &[String]) -> String {
    items.join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use crate::ai::{AiError, RecipeDetails, SkeletonRequest, SynthesisRequest};

    use super::*;

    /// Scripted backend whose consolidation outcome is fixed at build time.
    struct ScriptedAi {
        outcome: Result<ConsolidatedList, ()>,
    }

    #[async_trait]
    impl RecipeAi for ScriptedAi {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn plan_skeleton(&self, _req: &SkeletonRequest) -> Result<String, AiError> {
            unimplemented!("not used in shopping tests")
        }

        async fn recipe_details(&self, _req: &SynthesisRequest) -> Result<RecipeDetails, AiError> {
            unimplemented!("not used in shopping tests")
        }

        async fn consolidate_list(&self, _items: &[String]) -> Result<ConsolidatedList, AiError> {
            self.outcome
                .clone()
                .map_err(|_| AiError::Network("connection refused".to_string()))
        }
    }

    fn items() -> Vec<String> {
        vec!["2 tbsp olive oil".to_string(), "1 cup rice".to_string()]
    }

    #[tokio::test]
    async fn categorized_result_is_rendered() {
        let ai = ScriptedAi {
            outcome: Ok(ConsolidatedList::Categorized(BTreeMap::from([
                ("produce".to_string(), "2 onions".to_string()),
                ("pantry".to_string(), "1 cup rice\n2 tbsp olive oil".to_string()),
            ]))),
        };
        let list = consolidate_ingredients(&ai, &items()).await.unwrap();
        assert!(list.contains("PANTRY:\n1 cup rice"));
        assert!(list.contains("PRODUCE:\n2 onions"));
        // BTreeMap iterates sorted: pantry before produce.
        assert!(list.find("PANTRY").unwrap() < list.find("PRODUCE").unwrap());
    }

    #[tokio::test]
    async fn flat_result_passes_through() {
        let ai = ScriptedAi {
            outcome: Ok(ConsolidatedList::Flat("everything on one list".to_string())),
        };
        let list = consolidate_ingredients(&ai, &items()).await.unwrap();
        assert_eq!(list, "everything on one list");
    }

    #[tokio::test]
    async fn failure_falls_back_to_flat_join() {
        let ai = ScriptedAi { outcome: Err(()) };
        let list = consolidate_ingredients(&ai, &items()).await.unwrap();
        assert_eq!(list, "2 tbsp olive oil\n1 cup rice");
    }

    #[tokio::test]
    async fn empty_input_is_rejected_before_the_call() {
        let ai = ScriptedAi { outcome: Err(()) };
        let result = consolidate_ingredients(&ai, &[]).await;
        assert!(result.is_err());
    }

    #[test]
    fn render_categorized_uppercases_and_separates() {
        let categories = BTreeMap::from([
            ("dairy".to_string(), "1 cup yogurt\n".to_string()),
            ("produce".to_string(), "3 lemons".to_string()),
        ]);
        let rendered = render_categorized(&categories);
        assert_eq!(rendered, "DAIRY:\n1 cup yogurt\n\nPRODUCE:\n3 lemons");
    }

    #[test]
    fn flat_fallback_joins_lines() {
        assert_eq!(flat_fallback(&items()), "2 tbsp olive oil\n1 cup rice");
    }
}
