use anyhow::{Context, Error, Result, anyhow};
use derive_activity_key::ActivityKey;
use std::{
    fmt,
    io::{self, BufRead},
    str::FromStr,
};

use crate::{
    ebi_framework::{
        activity_key::{Activity, ActivityKey},
        ebi_file_handler::EbiFileHandler,
        ebi_input::{EbiTraitImporter, ImporterParameters},
        exportable::Exportable,
        importable::Importable,
        infoable::Infoable,
    },
    line_reader::LineReader,
    marking::Marking,
    techniques::alignment_error::{AlignmentError, AlignmentResult},
};

pub type TransitionIndex = usize;

pub const HEADER: &str = "accepting Petri net";

pub const FORMAT_SPECIFICATION: &str = "An accepting Petri net is a line-based structure. Lines starting with a # are ignored.
The first line is exactly `accepting Petri net'.
The second line is the number of places in the net.
Then, for each place, one line with the number of tokens of the place in the initial marking.
Then, for each place, one line with the number of tokens of the place in the final marking.
Then, the number of transitions follows.
For each transition, the first line is either `silent' or `label ' followed by the activity of the transition.
Then, the number of input places is given, followed by one line per input place.
Then, the number of output places is given, followed by one line per output place.
A place that is mentioned multiple times is connected with an arc of that cardinality.";

pub const EBI_ACCEPTING_PETRI_NET: EbiFileHandler = EbiFileHandler {
    name: "accepting Petri net",
    article: "an",
    file_extension: "apnet",
    format_specification: FORMAT_SPECIFICATION,
    validator: AcceptingPetriNet::validate_well_formed,
    trait_importers: &[EbiTraitImporter::AcceptingPetriNet(
        AcceptingPetriNet::read_as_accepting_petri_net,
    )],
};

/// A labelled Petri net together with an initial and a final marking.
#[derive(ActivityKey, Clone, Debug)]
pub struct AcceptingPetriNet {
    pub(crate) activity_key: ActivityKey,
    pub(crate) initial_marking: Marking,
    pub(crate) final_marking: Marking,
    pub(crate) labels: Vec<Option<Activity>>,
    pub(crate) place2output_transitions: Vec<Vec<TransitionIndex>>,
    pub(crate) transition2input_places: Vec<Vec<usize>>,
    pub(crate) transition2output_places: Vec<Vec<usize>>,
    pub(crate) transition2input_places_cardinality: Vec<Vec<u64>>,
    pub(crate) transition2output_places_cardinality: Vec<Vec<u64>>,
}

impl AcceptingPetriNet {
    pub fn new() -> Self {
        Self {
            activity_key: ActivityKey::new(),
            initial_marking: Marking::new(0),
            final_marking: Marking::new(0),
            labels: vec![],
            place2output_transitions: vec![],
            transition2input_places: vec![],
            transition2output_places: vec![],
            transition2input_places_cardinality: vec![],
            transition2output_places_cardinality: vec![],
        }
    }

    pub fn get_number_of_transitions(&self) -> usize {
        self.transition2input_places.len()
    }

    pub fn get_number_of_places(&self) -> usize {
        self.place2output_transitions.len()
    }

    pub fn get_initial_marking(&self) -> &Marking {
        &self.initial_marking
    }

    pub fn get_initial_marking_mut(&mut self) -> &mut Marking {
        &mut self.initial_marking
    }

    pub fn get_final_marking(&self) -> &Marking {
        &self.final_marking
    }

    pub fn get_final_marking_mut(&mut self) -> &mut Marking {
        &mut self.final_marking
    }

    pub fn is_transition_silent(&self, transition: TransitionIndex) -> bool {
        self.labels[transition].is_none()
    }

    pub fn get_transition_label(&self, transition: TransitionIndex) -> Option<Activity> {
        self.labels[transition]
    }

    pub fn get_input_places(&self, transition: TransitionIndex) -> &[usize] {
        &self.transition2input_places[transition]
    }

    pub fn get_input_places_cardinality(&self, transition: TransitionIndex) -> &[u64] {
        &self.transition2input_places_cardinality[transition]
    }

    pub fn get_output_places(&self, transition: TransitionIndex) -> &[usize] {
        &self.transition2output_places[transition]
    }

    pub fn get_output_places_cardinality(&self, transition: TransitionIndex) -> &[u64] {
        &self.transition2output_places_cardinality[transition]
    }

    pub fn add_place(&mut self) -> usize {
        let place = self.get_number_of_places();
        self.place2output_transitions.push(vec![]);
        self.initial_marking.add_place();
        self.final_marking.add_place();
        place
    }

    pub fn add_transition(&mut self, label: Option<Activity>) -> TransitionIndex {
        self.labels.push(label);
        self.transition2input_places.push(vec![]);
        self.transition2input_places_cardinality.push(vec![]);
        self.transition2output_places.push(vec![]);
        self.transition2output_places_cardinality.push(vec![]);
        self.get_number_of_transitions() - 1
    }

    /// Adds a transition labelled with `label`, registering the activity in the net's activity key.
    pub fn add_labelled_transition(&mut self, label: &str) -> TransitionIndex {
        let activity = self.activity_key.process_activity(label);
        self.add_transition(Some(activity))
    }

    pub fn add_transition_place_arc(
        &mut self,
        from_transition: TransitionIndex,
        to_place: usize,
        cardinality: u64,
    ) -> Result<()> {
        if from_transition >= self.get_number_of_transitions() {
            return Err(anyhow!(
                "non-existing transition {} referenced, while there are {}",
                from_transition,
                self.get_number_of_transitions()
            ));
        } else if to_place >= self.get_number_of_places() {
            return Err(anyhow!(
                "non-existing place {} referenced, while there are {}",
                to_place,
                self.get_number_of_places()
            ));
        }

        if let Some(pos) = self.transition2output_places[from_transition]
            .iter()
            .position(|p| *p == to_place)
        {
            self.transition2output_places_cardinality[from_transition][pos] += cardinality;
        } else {
            self.transition2output_places[from_transition].push(to_place);
            self.transition2output_places_cardinality[from_transition].push(cardinality);
        }
        Ok(())
    }

    pub fn add_place_transition_arc(
        &mut self,
        from_place: usize,
        to_transition: TransitionIndex,
        cardinality: u64,
    ) -> Result<()> {
        if to_transition >= self.get_number_of_transitions() {
            return Err(anyhow!(
                "non-existing transition {} referenced, while there are {}",
                to_transition,
                self.get_number_of_transitions()
            ));
        } else if from_place >= self.get_number_of_places() {
            return Err(anyhow!(
                "non-existing place {} referenced, while there are {}",
                from_place,
                self.get_number_of_places()
            ));
        }

        if let Some(pos) = self.transition2input_places[to_transition]
            .iter()
            .position(|p| *p == from_place)
        {
            self.transition2input_places_cardinality[to_transition][pos] += cardinality;
        } else {
            self.place2output_transitions[from_place].push(to_transition);
            self.transition2input_places[to_transition].push(from_place);
            self.transition2input_places_cardinality[to_transition].push(cardinality);
        }
        Ok(())
    }

    /// Checks the structural well-formedness that the alignment engine relies on.
    pub fn validate_structure(&self) -> AlignmentResult<()> {
        let number_of_places = self.get_number_of_places();
        if self.initial_marking.get_number_of_places() != number_of_places {
            return Err(AlignmentError::MalformedModel(format!(
                "the initial marking covers {} places, while the net has {}",
                self.initial_marking.get_number_of_places(),
                number_of_places
            )));
        }
        if self.final_marking.get_number_of_places() != number_of_places {
            return Err(AlignmentError::MalformedModel(format!(
                "the final marking covers {} places, while the net has {}",
                self.final_marking.get_number_of_places(),
                number_of_places
            )));
        }
        if number_of_places > 0 && self.final_marking.is_empty() {
            return Err(AlignmentError::MalformedModel(
                "the final marking is empty".to_string(),
            ));
        }

        for transition in 0..self.get_number_of_transitions() {
            if self.transition2input_places[transition].is_empty() {
                return Err(AlignmentError::MalformedModel(format!(
                    "transition {} has no input places",
                    self.transition_to_string(transition)
                )));
            }
            if self.transition2output_places[transition].is_empty() {
                return Err(AlignmentError::MalformedModel(format!(
                    "transition {} has no output places",
                    self.transition_to_string(transition)
                )));
            }
        }

        Ok(())
    }

    /// Parses the net and checks that it can be aligned against.
    pub fn validate_well_formed(reader: &mut dyn BufRead) -> Result<()> {
        let net = Self::import(reader)?;
        Ok(net.validate_structure()?)
    }

    pub fn read_as_accepting_petri_net(
        reader: &mut dyn BufRead,
        _parameters: &ImporterParameters,
    ) -> Result<Self> {
        Self::import(reader)
    }

    pub fn transition_to_string(&self, transition: TransitionIndex) -> String {
        match self.labels[transition] {
            Some(activity) => format!(
                "{} ({})",
                transition,
                self.activity_key.get_activity_label(&activity)
            ),
            None => format!("{} (silent)", transition),
        }
    }
}

impl Default for AcceptingPetriNet {
    fn default() -> Self {
        Self::new()
    }
}

impl Exportable for AcceptingPetriNet {
    fn export(&self, f: &mut dyn std::io::Write) -> Result<()> {
        Ok(write!(f, "{}", self)?)
    }
}

impl Infoable for AcceptingPetriNet {
    fn info(&self, f: &mut dyn std::io::Write) -> Result<()> {
        writeln!(f, "Number of places\t\t{}", self.get_number_of_places())?;
        writeln!(
            f,
            "Number of transitions\t\t{}",
            self.get_number_of_transitions()
        )?;
        writeln!(
            f,
            "Number of activities\t\t{}",
            self.activity_key.get_number_of_activities()
        )?;
        writeln!(
            f,
            "Number of silent transitions\t{}",
            (0..self.get_number_of_transitions())
                .filter(|transition| self.is_transition_silent(*transition))
                .count()
        )?;
        writeln!(f, "Initial marking\t\t\t{}", self.initial_marking)?;
        writeln!(f, "Final marking\t\t\t{}", self.final_marking)?;

        Ok(write!(f, "")?)
    }
}

impl fmt::Display for AcceptingPetriNet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", HEADER)?;
        writeln!(f, "# number of places\n{}", self.get_number_of_places())?;

        writeln!(f, "# initial marking")?;
        for place in self.initial_marking.get_place2token() {
            writeln!(f, "{}", place)?;
        }

        writeln!(f, "# final marking")?;
        for place in self.final_marking.get_place2token() {
            writeln!(f, "{}", place)?;
        }

        writeln!(
            f,
            "# number of transitions\n{}",
            self.get_number_of_transitions()
        )?;

        for transition in 0..self.get_number_of_transitions() {
            writeln!(f, "# transition {}", transition)?;

            if let Some(activity) = self.get_transition_label(transition) {
                writeln!(
                    f,
                    "label {}",
                    self.activity_key.get_activity_label(&activity)
                )?;
            } else {
                writeln!(f, "silent")?;
            }

            let inputs: u64 = self.transition2input_places_cardinality[transition]
                .iter()
                .sum();
            writeln!(f, "# number of input places\n{}", inputs)?;
            for (pos, place) in self.transition2input_places[transition].iter().enumerate() {
                for _ in 0..self.transition2input_places_cardinality[transition][pos] {
                    writeln!(f, "{}", place)?;
                }
            }

            let outputs: u64 = self.transition2output_places_cardinality[transition]
                .iter()
                .sum();
            writeln!(f, "# number of output places\n{}", outputs)?;
            for (pos, place) in self.transition2output_places[transition].iter().enumerate() {
                for _ in 0..self.transition2output_places_cardinality[transition][pos] {
                    writeln!(f, "{}", place)?;
                }
            }
        }

        write!(f, "")
    }
}

impl FromStr for AcceptingPetriNet {
    type Err = Error;

    fn from_str(s: &str) -> std::prelude::v1::Result<Self, Self::Err> {
        let mut reader = io::Cursor::new(s);
        Self::import(&mut reader)
    }
}

impl Importable for AcceptingPetriNet {
    fn import(reader: &mut dyn BufRead) -> Result<Self> {
        let mut lreader = LineReader::new(reader);

        let head = lreader
            .next_line_string()
            .with_context(|| format!("failed to read header, which should be {}", HEADER))?;
        if head != HEADER {
            return Err(anyhow!(
                "first line should be exactly `{}`, but found `{}` on line `{}`",
                HEADER,
                lreader.get_last_line(),
                lreader.get_last_line_number()
            ));
        }

        let mut result = AcceptingPetriNet::new();

        let number_of_places = lreader
            .next_line_index()
            .context("failed to read number of places")?;
        for _ in 0..number_of_places {
            result.add_place();
        }

        for place in 0..number_of_places {
            let tokens = lreader
                .next_line_natural()
                .with_context(|| format!("failed to read initial marking of place {}", place))?;
            result.initial_marking.increase(place, tokens)?;
        }

        for place in 0..number_of_places {
            let tokens = lreader
                .next_line_natural()
                .with_context(|| format!("failed to read final marking of place {}", place))?;
            result.final_marking.increase(place, tokens)?;
        }

        let number_of_transitions = lreader
            .next_line_index()
            .context("failed to read number of transitions")?;

        for transition in 0..number_of_transitions {
            let label_line = lreader
                .next_line_string()
                .with_context(|| format!("failed to read label of transition {}", transition))?;

            //read label
            if let Some(label) = label_line.trim_start().strip_prefix("label ") {
                result.add_labelled_transition(label);
            } else if label_line.trim() == "silent" {
                result.add_transition(None);
            } else {
                return Err(anyhow!(
                    "transition {} should be `silent` or start with `label `, but found `{}` at line {}",
                    transition,
                    label_line,
                    lreader.get_last_line_number()
                ));
            }

            //read input places
            let number_of_input_places = lreader.next_line_index().with_context(|| {
                format!(
                    "failed to read number of input places of transition {}",
                    transition
                )
            })?;
            for p in 0..number_of_input_places {
                let place = lreader.next_line_index().with_context(|| {
                    format!(
                        "failed to read input place number {} of transition {}",
                        p, transition
                    )
                })?;
                result
                    .add_place_transition_arc(place, transition, 1)
                    .with_context(|| {
                        format!(
                            "input place number {} of transition {}, at line {}",
                            p,
                            transition,
                            lreader.get_last_line_number()
                        )
                    })?;
            }

            //read output places
            let number_of_output_places = lreader.next_line_index().with_context(|| {
                format!(
                    "failed to read number of output places of transition {}",
                    transition
                )
            })?;
            for p in 0..number_of_output_places {
                let place = lreader.next_line_index().with_context(|| {
                    format!(
                        "failed to read output place number {} of transition {}",
                        p, transition
                    )
                })?;
                result
                    .add_transition_place_arc(transition, place, 1)
                    .with_context(|| {
                        format!(
                            "output place number {} of transition {}, at line {}",
                            p,
                            transition,
                            lreader.get_last_line_number()
                        )
                    })?;
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::{
        ebi_framework::activity_key::HasActivityKey,
        techniques::alignment_error::AlignmentError,
    };

    use super::AcceptingPetriNet;

    #[test]
    fn apnet_import_export() {
        let fin = fs::read_to_string("testfiles/a-b-tau.apnet").unwrap();
        let net = fin.parse::<AcceptingPetriNet>().unwrap();

        assert_eq!(net.get_number_of_places(), 3);
        assert_eq!(net.get_number_of_transitions(), 3);
        assert!(net.is_transition_silent(2));
        assert!(!net.is_transition_silent(0));
        assert_eq!(net.get_activity_key().get_number_of_activities(), 2);
        assert!(net.validate_structure().is_ok());

        let exported = net.to_string();
        let again = exported.parse::<AcceptingPetriNet>().unwrap();
        assert_eq!(exported, again.to_string());
    }

    #[test]
    fn apnet_arc_cardinality() {
        let net = "accepting Petri net\n2\n2\n0\n0\n1\n1\nlabel a\n2\n0\n0\n1\n1\n"
            .parse::<AcceptingPetriNet>()
            .unwrap();

        assert_eq!(net.get_input_places(0), &[0]);
        assert_eq!(net.get_input_places_cardinality(0), &[2]);
    }

    #[test]
    fn apnet_wrong_header() {
        assert!(
            "labelled Petri net\n0\n0\n"
                .parse::<AcceptingPetriNet>()
                .is_err()
        );
    }

    #[test]
    fn apnet_place_out_of_range() {
        assert!(
            "accepting Petri net\n1\n1\n1\n1\nsilent\n1\n3\n1\n0\n"
                .parse::<AcceptingPetriNet>()
                .is_err()
        );
    }

    #[test]
    fn apnet_source_transition_is_malformed() {
        let mut net = AcceptingPetriNet::new();
        let place = net.add_place();
        net.get_initial_marking_mut().increase(place, 1).unwrap();
        net.get_final_marking_mut().increase(place, 1).unwrap();
        let transition = net.add_labelled_transition("a");
        net.add_transition_place_arc(transition, place, 1).unwrap();

        assert!(matches!(
            net.validate_structure(),
            Err(AlignmentError::MalformedModel(_))
        ));
    }

    #[test]
    fn apnet_empty_final_marking_is_malformed() {
        let mut net = AcceptingPetriNet::new();
        let place = net.add_place();
        net.get_initial_marking_mut().increase(place, 1).unwrap();

        assert!(matches!(
            net.validate_structure(),
            Err(AlignmentError::MalformedModel(_))
        ));
    }
}
