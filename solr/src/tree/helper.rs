use super::{BetweenMatchWrapper, CombinedMatchTreeElement, MatchInstruction, MatchTreeElement, MatchWrapperType, MultiMatchWrapper, SingleMatchWrapper};
use crate::context::SolrConversionProcessContext;
use crate::error::ConversionError;
use crate::format::shift_date;
use crate::negation::is_guard;
use audlang::{CombiType, CoreExpression, MatchExpression, MatchOperator, NegationExpression};
use indexmap::IndexMap;
use std::borrow::Cow;

/// Builds the match tree of an expression and consolidates it.
///
/// Consolidation works level by level, bottom-up:
/// 1. `a > x OR a = x` (and negated `NOT a > x AND NOT a = x`) become a single bound
/// 2. date arguments on timestamp fields are aligned to whole days
/// 3. a lower and an upper bound of the same single-valued argument become a between (only if there are
///    exactly two)
/// 4. equalities or snippets of the same argument become a multi-value match
/// 5. negated multi matches get an `IS UNKNOWN` branch unless the argument is guarded
pub struct MatchTreeHelper<'c, 'a> {
    ctx: &'c SolrConversionProcessContext<'a>,
}

fn push_unique(items: &mut Vec<MatchTreeElement>, element: MatchTreeElement) {
    if !items.contains(&element) {
        items.push(element);
    }
}

fn leaf_members(element: &MatchTreeElement) -> Vec<MatchExpression> {
    match element {
        MatchTreeElement::Single(w) => vec![w.match_expr().clone()],
        MatchTreeElement::Multi(w) => w.members().to_vec(),
        MatchTreeElement::Between(w) => w.members().into_iter().cloned().collect(),
        _ => Vec::new(),
    }
}

/// Argument of a value-based bound with the given instruction: `a > x`, `a < x`, `a >= x` or `a <= x`
fn value_bound_arg(element: &MatchTreeElement, instruction: MatchInstruction) -> Option<&str> {
    match element {
        MatchTreeElement::Single(w)
            if w.instruction() == instruction
                && matches!(w.operator(), MatchOperator::GreaterThan | MatchOperator::LessThan)
                && w.match_expr().value().is_some() =>
        {
            Some(w.arg_name())
        }
        MatchTreeElement::Multi(w) if w.instruction() == instruction && w.wrapper_type() == MatchWrapperType::ValueOrEqMatch => Some(w.arg_name()),
        _ => None,
    }
}

/// Finds a bound and the equality on the same operand, both single matches with the given instruction
fn find_bound_pair(items: &[MatchTreeElement], instruction: MatchInstruction) -> Option<(usize, usize)> {
    items.iter().enumerate().find_map(|(i, item)| {
        let MatchTreeElement::Single(bound) = item else {
            return None;
        };
        if bound.instruction() != instruction || !matches!(bound.operator(), MatchOperator::GreaterThan | MatchOperator::LessThan) {
            return None;
        }
        let j = items.iter().position(|other| {
            matches!(other, MatchTreeElement::Single(eq)
                if eq.instruction() == instruction
                    && eq.operator() == MatchOperator::Equals
                    && eq.arg_name() == bound.arg_name()
                    && eq.node_type() == bound.node_type()
                    && eq.match_expr().operand() == bound.match_expr().operand())
        })?;
        Some((i, j))
    })
}

fn remove_all(items: &mut Vec<MatchTreeElement>, mut indices: Vec<usize>) {
    indices.sort_unstable_by(|a, b| b.cmp(a));
    for index in indices {
        items.remove(index);
    }
}

impl<'c, 'a> MatchTreeHelper<'c, 'a> {
    pub fn new(ctx: &'c SolrConversionProcessContext<'a>) -> Self { Self { ctx } }

    /// Converts an expression without special sets into a tree of wrapped matches.
    ///
    /// # Panics
    /// If the expression contains `<ALL>` or `<NONE>`.
    pub fn create_match_tree(&self, expression: &CoreExpression) -> Result<MatchTreeElement, ConversionError> {
        let tree = self.create(expression, &[])?;
        tracing::debug!("match tree: {}", tree);
        Ok(tree)
    }

    fn create(&self, expression: &CoreExpression, covered: &[&str]) -> Result<MatchTreeElement, ConversionError> {
        match expression {
            CoreExpression::Match(m) => Ok(MatchTreeElement::Single(self.single(m.clone(), MatchInstruction::Default)?)),
            CoreExpression::Negation(negation) => self.negation(negation, covered),
            CoreExpression::Combined(combined) => {
                let mut covered: Vec<&str> = covered.to_vec();
                if combined.combi_type() == CombiType::And {
                    covered.extend(combined.members().iter().filter_map(is_guard));
                }
                let children = combined.members().iter().map(|member| self.create(member, &covered)).collect::<Result<Vec<_>, _>>()?;
                Ok(MatchTreeElement::Combined(CombinedMatchTreeElement::new(combined.combi_type(), children)))
            }
            CoreExpression::SpecialSet(set) => panic!("special set {set:?} must be resolved before building the match tree"),
        }
    }

    /// Strict negations of reference matches verify the sides no sibling guard covers. Strict value
    /// negations without a guard get one.
    fn negation(&self, negation: &NegationExpression, covered: &[&str]) -> Result<MatchTreeElement, ConversionError> {
        let m = &negation.delegate;
        let strict = negation.strict && m.operator() != MatchOperator::IsUnknown;
        if !strict {
            return Ok(MatchTreeElement::Single(self.single(m.clone(), MatchInstruction::Negate)?));
        }
        if let Some(ref_arg_name) = m.referenced_arg_name() {
            let instruction = MatchInstruction::verify(!covered.contains(&m.arg_name()), !covered.contains(&ref_arg_name));
            return Ok(MatchTreeElement::Single(self.single(m.clone(), instruction)?));
        }
        let negated = MatchTreeElement::Single(self.single(m.clone(), MatchInstruction::Negate)?);
        if covered.contains(&m.arg_name()) {
            return Ok(negated);
        }
        let guard = MatchTreeElement::Single(self.single(MatchExpression::is_unknown(m.arg_name()), MatchInstruction::Negate)?);
        Ok(MatchTreeElement::Combined(CombinedMatchTreeElement::new(CombiType::And, vec![guard, negated])))
    }

    /// Whether a condition can be rendered inside a join shared with other conditions on its node type.
    ///
    /// Conditions on the main document always can. Otherwise complements must stay outside the join, except
    /// complements within the document (`f:* -P`) on node types with one document per main document.
    fn grouping_eligible(&self, node_type: &str, arg_name: &str, negated: bool, in_document: bool, verify: bool) -> Result<bool, ConversionError> {
        if self.ctx.is_main_node_type(node_type) {
            return Ok(true);
        }
        if verify {
            return Ok(false);
        }
        if !negated {
            return Ok(true);
        }
        Ok(in_document && !self.ctx.is_multi_doc(arg_name)?)
    }

    fn single(&self, m: MatchExpression, instruction: MatchInstruction) -> Result<SingleMatchWrapper, ConversionError> {
        let assignment = self.ctx.lookup_assignment(m.arg_name())?;
        if let Some(ref_arg_name) = m.referenced_arg_name() {
            self.ctx.lookup_assignment(ref_arg_name)?;
        }
        let negated = instruction.is_negation() != (m.operator() == MatchOperator::IsUnknown);
        let eligible = self.grouping_eligible(assignment.node_type(), m.arg_name(), negated, false, instruction.is_verify())?;
        Ok(SingleMatchWrapper::new(assignment.node_type(), m, instruction, eligible))
    }

    fn multi(&self, node_type: &str, members: Vec<MatchExpression>, instruction: MatchInstruction) -> Result<MultiMatchWrapper, ConversionError> {
        let first = &members[0];
        let in_document = !first.is_reference_match();
        let eligible = self.grouping_eligible(node_type, first.arg_name(), instruction.is_negation(), in_document, instruction.is_verify())?;
        Ok(MultiMatchWrapper::new(node_type, members, instruction, eligible))
    }

    fn between(&self, left: MultiMatchWrapper, right: MultiMatchWrapper) -> Result<BetweenMatchWrapper, ConversionError> {
        let eligible = self.grouping_eligible(left.node_type(), left.arg_name(), left.instruction().is_negation(), true, false)?;
        Ok(BetweenMatchWrapper::new(left, right, eligible))
    }

    /// Consolidates the tree; returns the input itself if nothing changed.
    pub fn consolidate<'t>(&self, tree: &'t MatchTreeElement) -> Result<Cow<'t, MatchTreeElement>, ConversionError> {
        let consolidated = match tree {
            MatchTreeElement::Combined(combined) => self.consolidate_level(combined.combi_type(), combined.children(), &[])?,
            MatchTreeElement::Group(_) => return Ok(Cow::Borrowed(tree)),
            leaf => self.consolidate_level(CombiType::And, std::slice::from_ref(leaf), &[])?,
        };
        if &consolidated == tree {
            return Ok(Cow::Borrowed(tree));
        }
        tracing::debug!("consolidated match tree: {}", consolidated);
        Ok(Cow::Owned(consolidated))
    }

    fn consolidate_level(&self, combi_type: CombiType, children: &[MatchTreeElement], covered: &[String]) -> Result<MatchTreeElement, ConversionError> {
        let mut covered = covered.to_vec();
        if combi_type == CombiType::And {
            for child in children {
                if let MatchTreeElement::Single(w) = child {
                    if w.is_guard() && !covered.iter().any(|c| c == w.arg_name()) {
                        covered.push(w.arg_name().to_string());
                    }
                }
            }
        }

        let mut items = Vec::with_capacity(children.len());
        for child in children {
            let consolidated = match child {
                MatchTreeElement::Combined(inner) => self.consolidate_level(inner.combi_type(), inner.children(), &covered)?,
                other => other.clone(),
            };
            match consolidated {
                MatchTreeElement::Combined(inner) if inner.combi_type() == combi_type => {
                    inner.into_children().into_iter().for_each(|c| push_unique(&mut items, c))
                }
                other => push_unique(&mut items, other),
            }
        }

        // OR levels merge positive conditions, AND levels negated ones; between works the other way round
        let (merge_instruction, between_instruction) = match combi_type {
            CombiType::Or => (MatchInstruction::Default, MatchInstruction::Negate),
            CombiType::And => (MatchInstruction::Negate, MatchInstruction::Default),
        };
        self.merge_bound_pairs(&mut items, merge_instruction)?;
        self.align_dates(&mut items)?;
        self.merge_betweens(&mut items, between_instruction)?;
        self.merge_values(&mut items, merge_instruction)?;
        self.add_unknown_branches(combi_type, &mut items, &covered)?;

        Ok(match items.len() {
            1 => items.remove(0),
            _ => MatchTreeElement::Combined(CombinedMatchTreeElement::new(combi_type, items)),
        })
    }

    fn merge_bound_pairs(&self, items: &mut Vec<MatchTreeElement>, instruction: MatchInstruction) -> Result<(), ConversionError> {
        while let Some((bound_index, eq_index)) = find_bound_pair(items, instruction) {
            let mut members = leaf_members(&items[bound_index]);
            members.extend(leaf_members(&items[eq_index]));
            let node_type = items[bound_index].common_node_type().unwrap_or_default().to_string();
            let multi = self.multi(&node_type, members, instruction)?;
            items[bound_index.min(eq_index)] = MatchTreeElement::Multi(multi);
            items.remove(bound_index.max(eq_index));
        }
        Ok(())
    }

    /// On day-aligned arguments `a = d` becomes `a > d-1 AND a < d+1`, `a >= d` becomes `a > d-1` and
    /// `a <= d` becomes `a < d+1`.
    fn align_dates(&self, items: &mut [MatchTreeElement]) -> Result<(), ConversionError> {
        for item in items.iter_mut() {
            let Some(arg_name) = item.arg_name() else {
                continue;
            };
            if !self.ctx.requires_date_alignment_for(arg_name)? {
                continue;
            }
            let aligned = match &*item {
                MatchTreeElement::Single(w) if w.operator() == MatchOperator::Equals => match w.match_expr().value() {
                    Some(value) => Some(self.aligned_equals(w, value)?),
                    None => None,
                },
                MatchTreeElement::Multi(w) if w.wrapper_type() == MatchWrapperType::ValueOrEqMatch => Some(self.aligned_bound(w)?),
                _ => None,
            };
            if let Some(aligned) = aligned {
                tracing::trace!("aligned {} to {}", item, aligned);
                *item = aligned;
            }
        }
        Ok(())
    }

    fn aligned_equals(&self, w: &SingleMatchWrapper, value: &str) -> Result<MatchTreeElement, ConversionError> {
        let arg_name = w.arg_name();
        let lower = MatchExpression::greater_than(arg_name, shift_date(arg_name, value, -1)?);
        let upper = MatchExpression::less_than(arg_name, shift_date(arg_name, value, 1)?);
        let left = self.multi(w.node_type(), vec![lower], w.instruction())?;
        let right = self.multi(w.node_type(), vec![upper], w.instruction())?;
        Ok(MatchTreeElement::Between(self.between(left, right)?))
    }

    fn aligned_bound(&self, w: &MultiMatchWrapper) -> Result<MatchTreeElement, ConversionError> {
        let arg_name = w.arg_name();
        let value = w.bound_value().unwrap_or_default();
        let m = match w.leading_operator() {
            MatchOperator::GreaterThan => MatchExpression::greater_than(arg_name, shift_date(arg_name, value, -1)?),
            _ => MatchExpression::less_than(arg_name, shift_date(arg_name, value, 1)?),
        };
        Ok(MatchTreeElement::Single(self.single(m, w.instruction())?))
    }

    fn bound_multi(&self, element: &MatchTreeElement) -> Result<Option<MultiMatchWrapper>, ConversionError> {
        Ok(match element {
            MatchTreeElement::Multi(w) => Some(w.clone()),
            MatchTreeElement::Single(w) => Some(self.multi(w.node_type(), vec![w.match_expr().clone()], w.instruction())?),
            _ => None,
        })
    }

    fn is_single_valued(&self, arg_name: &str) -> Result<bool, ConversionError> {
        let assignment = self.ctx.lookup_assignment(arg_name)?;
        Ok(!assignment.is_collection() && !assignment.is_multi_doc)
    }

    fn merge_betweens(&self, items: &mut Vec<MatchTreeElement>, instruction: MatchInstruction) -> Result<(), ConversionError> {
        let mut candidates: IndexMap<&str, Vec<usize>> = IndexMap::new();
        for (index, item) in items.iter().enumerate() {
            if let Some(arg_name) = value_bound_arg(item, instruction) {
                candidates.entry(arg_name).or_default().push(index);
            }
        }

        let mut merged = Vec::new();
        for (arg_name, indices) in candidates.iter().filter(|(_, indices)| indices.len() == 2) {
            // with several values per main document each bound may be met by a different value
            if !self.is_single_valued(arg_name)? {
                tracing::trace!("keeping bounds of {} apart", arg_name);
                continue;
            }
            let (Some(a), Some(b)) = (self.bound_multi(&items[indices[0]])?, self.bound_multi(&items[indices[1]])?) else {
                continue;
            };
            let (left, right) = if a.is_lower_bound() && b.is_upper_bound() {
                (a, b)
            } else if b.is_lower_bound() && a.is_upper_bound() {
                (b, a)
            } else {
                continue;
            };
            merged.push((indices[0], indices[1], MatchTreeElement::Between(self.between(left, right)?)));
        }

        let mut removals = Vec::new();
        for (index, other, between) in merged {
            items[index] = between;
            removals.push(other);
        }
        remove_all(items, removals);
        Ok(())
    }

    fn merge_values(&self, items: &mut Vec<MatchTreeElement>, instruction: MatchInstruction) -> Result<(), ConversionError> {
        let mut candidates: IndexMap<(String, MatchOperator), Vec<usize>> = IndexMap::new();
        for (index, item) in items.iter().enumerate() {
            let (arg_name, operator) = match item {
                MatchTreeElement::Single(w)
                    if w.instruction() == instruction
                        && matches!(w.operator(), MatchOperator::Equals | MatchOperator::Contains)
                        && w.match_expr().value().is_some() =>
                {
                    (w.arg_name(), w.operator())
                }
                MatchTreeElement::Multi(w) if w.instruction() == instruction && w.wrapper_type() == MatchWrapperType::MultiValueMatch => {
                    (w.arg_name(), w.leading_operator())
                }
                _ => continue,
            };
            if operator == MatchOperator::Equals && self.ctx.requires_date_alignment_for(arg_name)? {
                continue;
            }
            candidates.entry((arg_name.to_string(), operator)).or_default().push(index);
        }

        let mut removals = Vec::new();
        for indices in candidates.values().filter(|indices| indices.len() >= 2) {
            let members: Vec<MatchExpression> = indices.iter().flat_map(|&i| leaf_members(&items[i])).collect();
            let node_type = items[indices[0]].common_node_type().unwrap_or_default().to_string();
            items[indices[0]] = MatchTreeElement::Multi(self.multi(&node_type, members, instruction)?);
            removals.extend_from_slice(&indices[1..]);
        }
        remove_all(items, removals);
        Ok(())
    }

    /// A negated multi match is rendered as a complement within documents having a value, so without a guard
    /// the documents where the argument is unknown have to be added back.
    fn add_unknown_branches(&self, combi_type: CombiType, items: &mut Vec<MatchTreeElement>, covered: &[String]) -> Result<(), ConversionError> {
        let mut index = 0;
        while index < items.len() {
            let arg_name = match &items[index] {
                MatchTreeElement::Multi(w) if w.instruction() == MatchInstruction::Negate && !w.wrapper_type().is_reference_match() => {
                    Some(w.arg_name().to_string())
                }
                MatchTreeElement::Between(w) if w.instruction() == MatchInstruction::Negate => Some(w.arg_name().to_string()),
                _ => None,
            };
            let Some(arg_name) = arg_name.filter(|name| !covered.contains(name)) else {
                index += 1;
                continue;
            };
            let unknown = MatchTreeElement::Single(self.single(MatchExpression::is_unknown(arg_name), MatchInstruction::Default)?);
            match combi_type {
                CombiType::Or => {
                    if !items.contains(&unknown) {
                        items.insert(index + 1, unknown);
                        index += 1;
                    }
                }
                CombiType::And => {
                    let negated = items[index].clone();
                    items[index] = MatchTreeElement::Combined(CombinedMatchTreeElement::new(CombiType::Or, vec![negated, unknown]));
                }
            }
            index += 1;
        }
        Ok(())
    }
}
