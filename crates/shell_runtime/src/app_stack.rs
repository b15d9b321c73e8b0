//! Mobile card stack: one full-screen card per process, with back navigation.

use std::collections::BTreeMap;

use crate::{
    error::{ShellError, ShellResult},
    model::{AppCard, CardId, ProcessId},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppStackTable {
    cards: BTreeMap<CardId, AppCard>,
    active: Option<CardId>,
    navigation_stack: Vec<CardId>,
}

impl AppStackTable {
    pub fn card(&self, id: CardId) -> Option<&AppCard> {
        self.cards.get(&id)
    }

    pub fn cards(&self) -> impl Iterator<Item = &AppCard> {
        self.cards.values()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn active_card_id(&self) -> Option<CardId> {
        self.active
    }

    pub fn navigation_stack(&self) -> &[CardId] {
        &self.navigation_stack
    }

    /// Builds the card a mobile process is shown in.
    pub fn create_card(process_id: ProcessId, title: impl Into<String>) -> AppCard {
        AppCard {
            id: CardId(process_id),
            process_id,
            title: title.into(),
            active: true,
        }
    }

    /// Adds a card and makes it active. The previously active card goes on the navigation stack.
    pub fn add_card(&mut self, card: AppCard) {
        let id = card.id;
        self.cards.insert(id, card);
        self.activate(id, false);
    }

    pub fn remove_card(&mut self, id: CardId) -> Option<AppCard> {
        let card = self.cards.remove(&id)?;
        if self.active == Some(id) {
            self.active = None;
        }
        self.navigation_stack.retain(|existing| *existing != id);
        Some(card)
    }

    /// # Errors
    ///
    /// Returns [`ShellError::CardNotFound`] when the card does not exist.
    pub fn set_active_card(&mut self, id: CardId, skip_navigation_stack: bool) -> ShellResult<bool> {
        if !self.cards.contains_key(&id) {
            return Err(ShellError::CardNotFound(id));
        }
        if self.active == Some(id) {
            return Ok(false);
        }
        self.activate(id, skip_navigation_stack);
        Ok(true)
    }

    /// Returns to the home screen, dropping the newest navigation entry.
    pub fn hide_active_card(&mut self) -> bool {
        let Some(id) = self.active.take() else {
            return false;
        };
        if let Some(card) = self.cards.get_mut(&id) {
            card.active = false;
        }
        self.navigation_stack.pop();
        true
    }

    pub fn pop_navigation_stack(&mut self) -> Option<CardId> {
        self.navigation_stack.pop()
    }

    /// # Errors
    ///
    /// Returns [`ShellError::CardNotFound`] when the card does not exist.
    pub fn set_title(&mut self, id: CardId, title: impl Into<String>) -> ShellResult<()> {
        let card = self.cards.get_mut(&id).ok_or(ShellError::CardNotFound(id))?;
        card.title = title.into();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.cards.clear();
        self.active = None;
        self.navigation_stack.clear();
    }

    fn activate(&mut self, id: CardId, skip_navigation_stack: bool) {
        if let Some(previous) = self.active.filter(|previous| *previous != id) {
            if !skip_navigation_stack {
                self.navigation_stack.push(previous);
            }
        }
        for (key, card) in &mut self.cards {
            card.active = *key == id;
        }
        self.active = Some(id);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn card(pid: u64) -> AppCard {
        AppStackTable::create_card(ProcessId(pid), format!("card {pid}"))
    }

    #[test]
    fn adding_cards_stacks_the_previous_active_card() {
        let mut stack = AppStackTable::default();
        stack.add_card(card(1));
        stack.add_card(card(2));

        assert_eq!(stack.active_card_id(), Some(CardId(ProcessId(2))));
        assert_eq!(stack.navigation_stack(), &[CardId(ProcessId(1))]);
        assert!(!stack.card(CardId(ProcessId(1))).expect("card").active);
    }

    #[test]
    fn set_active_card_can_skip_navigation_history() {
        let mut stack = AppStackTable::default();
        stack.add_card(card(1));
        stack.add_card(card(2));

        assert_eq!(stack.set_active_card(CardId(ProcessId(1)), true), Ok(true));
        assert_eq!(stack.navigation_stack(), &[CardId(ProcessId(1))]);
        assert_eq!(stack.set_active_card(CardId(ProcessId(1)), false), Ok(false));
        assert_eq!(
            stack.set_active_card(CardId(ProcessId(7)), false),
            Err(ShellError::CardNotFound(CardId(ProcessId(7))))
        );
    }

    #[test]
    fn hide_and_remove_clear_active_state() {
        let mut stack = AppStackTable::default();
        stack.add_card(card(1));
        stack.add_card(card(2));

        assert!(stack.hide_active_card());
        assert_eq!(stack.active_card_id(), None);
        assert!(stack.navigation_stack().is_empty());
        assert!(!stack.hide_active_card());

        stack.set_active_card(CardId(ProcessId(2)), false).expect("activate");
        stack.remove_card(CardId(ProcessId(2)));
        assert_eq!(stack.active_card_id(), None);
        assert_eq!(stack.len(), 1);
    }
}
