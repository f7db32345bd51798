//! Dependency ordering and strategy binding.
//!
//! A concept extracted relative to another concept must be evaluated after
//! it. Resolution validates the set, computes an execution order that keeps
//! independent concepts in their original relative order, and binds each
//! concept to its extraction strategy in that order.

use crate::concept::{validate_concepts, ConceptDefinition, ConceptId};
use crate::error::{ConfigurationError, ExtractionError, Violation};
use crate::extraction::{ExtractionStrategy, StrategyLookup};
use std::collections::{HashMap, HashSet};

/// Compute the execution order of `concepts` as indices into the slice.
///
/// # Algorithm
/// 1. Walk the concepts in their original order, skipping placed ones
/// 2. Follow the dependency chain until a concept without dependency or an
///    already placed one
/// 3. Append the chain dependency-first, skipping placed members
///
/// A concept seen twice in the same chain is a cycle.
///
/// # Example
/// ```ignore
/// use gleaner::resolver::compute_execution_order;
///
/// let order = compute_execution_order(&concepts)?;
/// ```
pub fn compute_execution_order(
    concepts: &[ConceptDefinition],
) -> Result<Vec<usize>, ConfigurationError> {
    let positions: HashMap<&str, usize> = concepts
        .iter()
        .enumerate()
        .map(|(i, c)| (c.description.as_str(), i))
        .collect();

    let mut order = Vec::with_capacity(concepts.len());
    let mut placed: HashSet<usize> = HashSet::new();

    for start in 0..concepts.len() {
        if placed.contains(&start) {
            continue;
        }

        let mut chain = vec![start];
        let mut visited: HashSet<usize> = HashSet::from([start]);
        let mut current = start;

        while let Some(key) = concepts[current].dependency() {
            let next = *positions.get(key).ok_or_else(|| {
                ConfigurationError::Invalid(vec![Violation::UnknownDependency(vec![key.to_string()])])
            })?;

            if placed.contains(&next) {
                break;
            }
            if !visited.insert(next) {
                let mut path: Vec<String> = chain
                    .iter()
                    .map(|&i| concepts[i].description.clone())
                    .collect();
                path.push(concepts[next].description.clone());
                return Err(ConfigurationError::DependencyCycle(path));
            }

            chain.push(next);
            current = next;
        }

        for id in chain.into_iter().rev() {
            if placed.insert(id) {
                order.push(id);
            }
        }
    }

    Ok(order)
}

/// A concept bound to its strategy, addressed by its execution position.
#[derive(Debug, Clone)]
pub struct ResolvedConcept {
    id: ConceptId,
    definition: ConceptDefinition,
    strategy: ExtractionStrategy,
}

impl ResolvedConcept {
    pub fn id(&self) -> ConceptId {
        self.id
    }

    pub fn definition(&self) -> &ConceptDefinition {
        &self.definition
    }

    pub fn description(&self) -> &str {
        &self.definition.description
    }

    pub fn strategy(&self) -> &ExtractionStrategy {
        &self.strategy
    }
}

/// Validated concept set in execution order.
///
/// Immutable once built; share it across as many parse runs as needed.
#[derive(Debug, Clone, Default)]
pub struct ResolvedConcepts {
    concepts: Vec<ResolvedConcept>,
    index: HashMap<String, ConceptId>,
}

impl ResolvedConcepts {
    /// Validate, order and bind a concept set.
    ///
    /// # Errors
    /// Returns every validation violation at once, a dependency cycle, or the
    /// first definition whose strategy cannot be built.
    pub fn resolve(definitions: Vec<ConceptDefinition>) -> Result<Self, ConfigurationError> {
        validate_concepts(&definitions)?;
        let order = compute_execution_order(&definitions)?;

        let mut slots: Vec<Option<ConceptDefinition>> = definitions.into_iter().map(Some).collect();
        let mut resolved = ResolvedConcepts {
            concepts: Vec::with_capacity(order.len()),
            index: HashMap::with_capacity(order.len()),
        };

        for position in order {
            let Some(definition) = slots[position].take() else {
                continue;
            };

            let prerequisite = definition
                .dependency()
                .and_then(|key| resolved.index.get(key).copied());
            let strategy = ExtractionStrategy::from_definition(&definition, prerequisite)?;
            let id = ConceptId(resolved.concepts.len());

            resolved.index.insert(definition.description.clone(), id);
            resolved.concepts.push(ResolvedConcept {
                id,
                definition,
                strategy,
            });
        }

        tracing::debug!(order = ?resolved.descriptions(), "Resolved concept execution order");

        Ok(resolved)
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResolvedConcept> {
        self.concepts.iter()
    }

    pub fn get(&self, id: ConceptId) -> Option<&ResolvedConcept> {
        self.concepts.get(id.index())
    }

    /// Look a concept up by description.
    pub fn find(&self, description: &str) -> Option<&ResolvedConcept> {
        self.index.get(description).and_then(|&id| self.get(id))
    }

    /// Descriptions in execution order.
    pub fn descriptions(&self) -> Vec<&str> {
        self.concepts.iter().map(|c| c.description()).collect()
    }

    /// Raw value of concept `id` on `content`, resolving prerequisites.
    pub fn raw_value(&self, id: ConceptId, content: &str) -> Result<String, ExtractionError> {
        match self.get(id) {
            Some(concept) => concept.strategy.raw_value(content, self),
            None => Ok(String::new()),
        }
    }
}

impl StrategyLookup for ResolvedConcepts {
    fn strategy(&self, id: ConceptId) -> Option<&ExtractionStrategy> {
        self.get(id).map(|c| &c.strategy)
    }
}

impl<'a> IntoIterator for &'a ResolvedConcepts {
    type Item = &'a ResolvedConcept;
    type IntoIter = std::slice::Iter<'a, ResolvedConcept>;

    fn into_iter(self) -> Self::IntoIter {
        self.concepts.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concept::StrategyKind;
    use crate::converter::TargetType;

    fn plain(description: &str) -> ConceptDefinition {
        ConceptDefinition::new(description, TargetType::Text, StrategyKind::WholeLine)
    }

    fn dependent(description: &str, after: &str) -> ConceptDefinition {
        ConceptDefinition::new(description, TargetType::Text, StrategyKind::ConceptAndPattern)
            .with_after_concept(after)
            .with_before_regex(r"\d+")
    }

    #[test]
    fn test_order_without_dependencies_is_identity() {
        let concepts = vec![plain("C"), plain("A"), plain("B")];

        let order = compute_execution_order(&concepts).unwrap();

        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_chain_places_prerequisite_first() {
        let concepts = vec![dependent("A", "B"), plain("B")];

        let order = compute_execution_order(&concepts).unwrap();

        assert_eq!(order, vec![1, 0]);
    }

    #[test]
    fn test_long_chain_keeps_independent_order() {
        let concepts = vec![
            plain("X"),
            dependent("A", "B"),
            dependent("B", "C"),
            plain("C"),
            plain("Y"),
        ];

        let order = compute_execution_order(&concepts).unwrap();

        assert_eq!(order, vec![0, 3, 2, 1, 4]);
    }

    #[test]
    fn test_shared_prerequisite_placed_once() {
        let concepts = vec![dependent("A", "C"), dependent("B", "C"), plain("C")];

        let order = compute_execution_order(&concepts).unwrap();

        assert_eq!(order, vec![2, 0, 1]);
    }

    #[test]
    fn test_cycle_is_reported() {
        let concepts = vec![dependent("A", "B"), dependent("B", "A")];

        let err = compute_execution_order(&concepts).unwrap_err();

        assert_eq!(
            err,
            ConfigurationError::DependencyCycle(vec![
                "A".to_string(),
                "B".to_string(),
                "A".to_string()
            ])
        );
        assert!(err.to_string().contains("A -> B -> A"));
    }

    #[test]
    fn test_resolve_binds_in_execution_order() {
        let resolved = ResolvedConcepts::resolve(vec![dependent("A", "B"), plain("B")]).unwrap();

        assert_eq!(resolved.descriptions(), vec!["B", "A"]);
        assert_eq!(resolved.find("B").unwrap().id(), ConceptId(0));
        assert_eq!(resolved.find("A").unwrap().id(), ConceptId(1));
        assert_eq!(
            resolved.find("A").unwrap().strategy().kind(),
            StrategyKind::ConceptAndPattern
        );
    }

    #[test]
    fn test_resolve_rejects_invalid_set() {
        let result = ResolvedConcepts::resolve(vec![dependent("A", "missing")]);

        assert!(matches!(result, Err(ConfigurationError::Invalid(_))));
    }

    #[test]
    fn test_resolve_rejects_cycle() {
        let result = ResolvedConcepts::resolve(vec![
            plain("X"),
            dependent("A", "B"),
            dependent("B", "A"),
        ]);

        assert!(matches!(result, Err(ConfigurationError::DependencyCycle(_))));
    }

    #[test]
    fn test_raw_value_through_prerequisite() {
        let resolved = ResolvedConcepts::resolve(vec![
            ConceptDefinition::new("label", TargetType::Text, StrategyKind::Offset)
                .with_leading_text("Ref:")
                .with_trim(false),
            dependent("tail", "label"),
        ])
        .unwrap();

        let id = resolved.find("tail").unwrap().id();
        assert_eq!(resolved.raw_value(id, "x Ref: ABC 99").unwrap(), "");

        let resolved = ResolvedConcepts::resolve(vec![
            ConceptDefinition::new("label", TargetType::Text, StrategyKind::Pattern)
                .with_regex("Ref:"),
            dependent("tail", "label"),
        ])
        .unwrap();

        let id = resolved.find("tail").unwrap().id();
        assert_eq!(resolved.raw_value(id, "x Ref: ABC 99").unwrap(), "ABC");
    }
}
