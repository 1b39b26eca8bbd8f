use anyhow::{Result, anyhow};
use std::{
    collections::BTreeSet,
    fmt::{Debug, Display},
};
use strum_macros::EnumIter;

use crate::{
    ebi_objects::accepting_petri_net::AcceptingPetriNet,
    ebi_traits::ebi_trait_event_log::EbiTraitEventLog,
};

use super::{
    ebi_command::{EBI_COMMANDS, EbiCommand},
    ebi_file_handler::{EBI_FILE_HANDLERS, EbiFileHandler},
    ebi_input::{EbiInput, EbiInputType},
    ebi_trait_object::EbiTraitObject,
};

#[derive(Clone, Copy, PartialEq, Eq, EnumIter, Hash, Default)]
pub enum EbiTrait {
    AcceptingPetriNet,
    #[default]
    EventLog,
}

impl EbiTrait {
    /**
     * Get all file handlers that can import to this trait.
     */
    pub fn get_file_handlers(&self) -> Vec<&'static EbiFileHandler> {
        EBI_FILE_HANDLERS
            .iter()
            .filter(|file_handler| {
                file_handler
                    .trait_importers
                    .iter()
                    .any(|importer| &importer.get_trait() == self)
            })
            .collect()
    }

    pub fn get_article(&self) -> &str {
        match self {
            EbiTrait::AcceptingPetriNet => "an",
            EbiTrait::EventLog => "an",
        }
    }

    /**
     * Get all commands that take this trait as one of their inputs.
     */
    pub fn get_applicable_commands(&self) -> BTreeSet<Vec<&'static EbiCommand>> {
        let mut result = EBI_COMMANDS.get_command_paths();
        result.retain(|path| match path.last() {
            Some(EbiCommand::Command { input_types, .. }) => input_types.iter().any(|input_types| {
                input_types.contains(&&EbiInputType::Trait(*self))
            }),
            _ => false,
        });
        result
    }

    pub fn get_explanation(&self) -> &str {
        match self {
            EbiTrait::AcceptingPetriNet => {
                "A labelled Petri net with an initial and a final marking, of which the reachable state space can be traversed."
            }
            EbiTrait::EventLog => "A sequence of traces, each with an identity and a sequence of activities.",
        }
    }
}

impl Display for EbiTrait {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                EbiTrait::AcceptingPetriNet => "accepting Petri net",
                EbiTrait::EventLog => "event log",
            }
        )
    }
}

impl Debug for EbiTrait {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self, f)
    }
}

pub trait FromEbiTraitObject {
    fn from_trait_object(object: EbiInput) -> Result<Box<Self>>;
}

impl FromEbiTraitObject for AcceptingPetriNet {
    fn from_trait_object(object: EbiInput) -> Result<Box<Self>> {
        match object {
            EbiInput::Trait(EbiTraitObject::AcceptingPetriNet(e), _) => Ok(Box::new(e)),
            _ => Err(anyhow!(
                "cannot read {} {} as an accepting Petri net",
                object.get_type().get_article(),
                object.get_type()
            )),
        }
    }
}

impl FromEbiTraitObject for dyn EbiTraitEventLog {
    fn from_trait_object(object: EbiInput) -> Result<Box<Self>> {
        match object {
            EbiInput::Trait(EbiTraitObject::EventLog(e), _) => Ok(e),
            _ => Err(anyhow!(
                "cannot read {} {} as an event log",
                object.get_type().get_article(),
                object.get_type()
            )),
        }
    }
}

impl FromEbiTraitObject for Vec<String> {
    fn from_trait_object(object: EbiInput) -> Result<Box<Self>> {
        match object {
            EbiInput::Strings(e) => Ok(Box::new(e)),
            _ => Err(anyhow!(
                "cannot read {} {} as a list of texts",
                object.get_type().get_article(),
                object.get_type()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use crate::{
        ebi_framework::{ebi_input::EbiInput, ebi_trait_object::EbiTraitObject},
        ebi_objects::accepting_petri_net::{AcceptingPetriNet, EBI_ACCEPTING_PETRI_NET},
        ebi_traits::ebi_trait_event_log::EbiTraitEventLog,
    };

    use super::{EbiTrait, FromEbiTraitObject};

    #[test]
    fn traits() {
        for etrait in EbiTrait::iter() {
            let expected = match etrait {
                EbiTrait::AcceptingPetriNet => 1,
                EbiTrait::EventLog => 2,
            };
            assert_eq!(etrait.get_file_handlers().len(), expected);
            assert!(!etrait.get_applicable_commands().is_empty());
            etrait.get_article();
            etrait.get_explanation();
            let _ = format!("{:?}", etrait);
        }
    }

    #[test]
    fn strings_from_input() {
        let strings =
            Vec::<String>::from_trait_object(EbiInput::Strings(vec!["a".to_string()])).unwrap();
        assert_eq!(*strings, vec!["a".to_string()]);
    }

    #[test]
    fn wrong_trait() {
        let net = AcceptingPetriNet::new();
        let input = EbiInput::Trait(
            EbiTraitObject::AcceptingPetriNet(net),
            &EBI_ACCEPTING_PETRI_NET,
        );
        assert!(<dyn EbiTraitEventLog>::from_trait_object(input).is_err());
    }
}
