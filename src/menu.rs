//! Interactive numbered menu.
//!
//! Shown when `regswap` runs without a subcommand. Every answer comes from
//! a [`Prompter`], so a scripted prompter can drive the whole loop.

use console::{Term, style};
use tracing::{debug, info, instrument};

use crate::error::{Result, RsError};
use crate::manager::{OrphanPolicy, ProfileManager};
use crate::output::Output;
use crate::prompt::Prompter;

/// Top-level menu entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Save,
    Load,
    Manage,
    DeleteWithSave,
    DeleteWithoutSave,
    Options,
    Exit,
}

impl MenuChoice {
    pub const ALL: [Self; 7] = [
        Self::Save,
        Self::Load,
        Self::Manage,
        Self::DeleteWithSave,
        Self::DeleteWithoutSave,
        Self::Options,
        Self::Exit,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Save => "Save current keys as a profile",
            Self::Load => "Load a profile",
            Self::Manage => "Manage profiles (rename/delete)",
            Self::DeleteWithSave => "Delete live keys (save a profile first)",
            Self::DeleteWithoutSave => "Delete live keys (no save)",
            Self::Options => "Options (managed keys, default name)",
            Self::Exit => "Exit",
        }
    }

    /// Parse a 1-based menu number.
    pub fn parse(input: &str) -> Option<Self> {
        let n: usize = input.trim().parse().ok()?;
        Self::ALL.get(n.checked_sub(1)?).copied()
    }
}

/// Menu loop state.
pub struct Menu<'a> {
    manager: &'a mut ProfileManager,
    out: &'a dyn Output,
    prompter: &'a mut dyn Prompter,
    term: Term,
}

impl<'a> Menu<'a> {
    pub fn new(
        manager: &'a mut ProfileManager,
        out: &'a dyn Output,
        prompter: &'a mut dyn Prompter,
    ) -> Self {
        Self {
            manager,
            out,
            prompter,
            term: Term::stdout(),
        }
    }

    /// Run until Exit is chosen or input ends.
    #[instrument(skip(self))]
    pub fn run(&mut self) -> Result<()> {
        info!("Interactive menu started");
        loop {
            self.print_menu();
            let Some(answer) = self.prompter.input("Select an option [1-7]:") else {
                debug!("Input closed; leaving menu");
                return Ok(());
            };
            let Some(choice) = MenuChoice::parse(&answer) else {
                self.out.warning(&format!("'{}' is not a menu option", answer.trim()));
                continue;
            };
            if choice == MenuChoice::Exit {
                info!("Menu exit");
                return Ok(());
            }
            // A failed action is reported; the menu keeps running
            if let Err(e) = self.dispatch(choice) {
                self.out.error(&e);
            }
        }
    }

    fn print_menu(&self) {
        let _ = self.term.write_line("");
        let _ = self
            .term
            .write_line(&style("regswap").bold().cyan().to_string());
        for (idx, choice) in MenuChoice::ALL.iter().enumerate() {
            let _ = self
                .term
                .write_line(&format!("  {}. {}", idx + 1, choice.label()));
        }
    }

    fn dispatch(&mut self, choice: MenuChoice) -> Result<()> {
        debug!(?choice, "Menu choice");
        match choice {
            MenuChoice::Save => self.save(),
            MenuChoice::Load => self.load(),
            MenuChoice::Manage => self.manage(),
            MenuChoice::DeleteWithSave => self.delete_live(true),
            MenuChoice::DeleteWithoutSave => self.delete_live(false),
            MenuChoice::Options => self.options(),
            MenuChoice::Exit => Ok(()),
        }
    }

    fn ask_profile_name(&mut self) -> String {
        let prompt = format!(
            "Profile name (blank for '{}'):",
            self.manager.config().default_profile_name
        );
        self.prompter.input(&prompt).unwrap_or_default()
    }

    fn save(&mut self) -> Result<()> {
        let name = self.ask_profile_name();
        let report = self.manager.save_profile(&name, self.prompter)?;
        self.out.save_report(&report);
        Ok(())
    }

    /// List profiles and read a name or list number; `None` on blank input.
    ///
    /// An exact name wins over a list number, so a profile named "2" stays
    /// reachable.
    fn select_profile(&mut self) -> Option<String> {
        let profiles = self.manager.profiles();
        if profiles.is_empty() {
            self.out.warning("No saved profiles");
            return None;
        }
        self.out.profile_list(profiles);

        let answer = self.prompter.input("Profile number or name (blank to go back):")?;
        let answer = answer.trim();
        if answer.is_empty() {
            return None;
        }
        if let Ok(profile) = self.manager.find_profile(answer) {
            return Some(profile.folder_id.clone());
        }
        let by_number = answer
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|idx| self.manager.profiles().get(idx));
        Some(by_number.map_or_else(|| answer.to_string(), |p| p.folder_id.clone()))
    }

    fn load(&mut self) -> Result<()> {
        let Some(profile) = self.select_profile() else {
            return Ok(());
        };
        let report = self
            .manager
            .load_profile(&profile, OrphanPolicy::Ask, self.prompter)?;
        self.out.load_report(&report);
        Ok(())
    }

    fn manage(&mut self) -> Result<()> {
        let Some(profile) = self.select_profile() else {
            return Ok(());
        };
        let name = self.manager.find_profile(&profile)?.name.clone();
        let action = self
            .prompter
            .input(&format!("'{name}': (r)ename, (d)elete, or blank to go back:"))
            .unwrap_or_default();

        match action.trim().to_lowercase().as_str() {
            "r" | "rename" => {
                let new_name = self.prompter.input("New name:").unwrap_or_default();
                let outcome = self.manager.rename_profile(&profile, &new_name)?;
                self.out.rename_result(&name, new_name.trim(), &outcome);
            }
            "d" | "delete" => {
                let report = self.manager.delete_profile(&profile, self.prompter)?;
                self.out.remove_report(&report);
            }
            "" => {}
            other => self.out.warning(&format!("'{other}' is not an action")),
        }
        Ok(())
    }

    fn delete_live(&mut self, with_save: bool) -> Result<()> {
        let save_as = if with_save {
            Some(self.ask_profile_name())
        } else {
            None
        };
        let report = self
            .manager
            .delete_live_keys(save_as.as_deref(), self.prompter)?;
        self.out.delete_report(&report);
        Ok(())
    }

    fn options(&mut self) -> Result<()> {
        loop {
            self.out.key_list(&self.manager.config().managed_keys);
            let _ = self.term.write_line(&format!(
                "  Default profile name: {}",
                style(&self.manager.config().default_profile_name).bold()
            ));
            let Some(answer) = self
                .prompter
                .input("Key number to toggle, 'n' to set the default name, blank to go back:")
            else {
                return Ok(());
            };
            let answer = answer.trim();
            if answer.is_empty() {
                return Ok(());
            }

            if answer.eq_ignore_ascii_case("n") {
                let name = self.prompter.input("Default profile name:").unwrap_or_default();
                self.manager.config_mut().set_default_profile_name(&name)?;
                self.out.default_name_set(name.trim());
                continue;
            }

            let key = answer
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|idx| self.manager.config().managed_keys.get(idx))
                .map(|k| k.path.clone())
                .ok_or_else(|| RsError::KeyNotFound {
                    key: answer.to_string(),
                })?;
            self.manager.config_mut().toggle_inclusion(&key)?;
            if let Some(state) = self.manager.config().find_key(&key) {
                self.out.inclusion_changed(state);
            }
        }
    }
}
