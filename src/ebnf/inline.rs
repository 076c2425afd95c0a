//! Production inlining
//!
//! Inlining replaces every reference to a production with a copy of its body
//! and drops the production itself. Names are processed in the order given,
//! so a later name sees the bodies left behind by earlier ones.

use super::error::GrammarError;
use super::grammar::Grammar;
use std::collections::HashSet;

impl Grammar {
    /// Return a copy of this grammar with `names` inlined. `self` is left
    /// untouched, including when the request fails.
    pub fn inlined<I, S>(&self, names: I) -> Result<Grammar, GrammarError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut copy = self.clone();
        copy.inline(names)?;
        Ok(copy)
    }

    /// Inline `names` in place. On error the grammar may be partially
    /// inlined; callers own a private copy.
    pub fn inline<I, S>(&mut self, names: I) -> Result<(), GrammarError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut done = HashSet::new();
        for name in names {
            let name = name.as_ref();
            if done.insert(name.to_string()) {
                self.inline_production(name)?;
            }
        }
        Ok(())
    }

    fn inline_production(&mut self, name: &str) -> Result<(), GrammarError> {
        let body = match self.get(name) {
            Some(body) => body,
            None => {
                return Err(GrammarError::UnknownProduction {
                    name: name.to_string(),
                })
            }
        };
        if body.refers_to(name) {
            return Err(GrammarError::InlineCycle {
                name: name.to_string(),
            });
        }

        let replacement = self.remove(name).map(|body| body.grouped());
        if let Some(replacement) = replacement {
            log::trace!("inlining {}: {}", name, replacement);
            for body in self.bodies_mut() {
                body.substitute(name, &replacement);
            }
        }
        Ok(())
    }
}
