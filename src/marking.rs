use anyhow::{Result, anyhow};
use std::fmt::{Debug, Display, Formatter};

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Marking {
    pub(crate) place2token: Vec<u64>, //for each place: number of tokens in that place
}

impl Marking {
    pub fn new(size: usize) -> Self {
        Marking {
            place2token: vec![0; size],
        }
    }

    pub fn get_place2token(&self) -> &Vec<u64> {
        &self.place2token
    }

    pub fn get_number_of_places(&self) -> usize {
        self.place2token.len()
    }

    pub fn get_tokens(&self, place: usize) -> u64 {
        self.place2token[place]
    }

    pub fn increase(&mut self, place: usize, amount: u64) -> Result<()> {
        if self.place2token[place] > u64::MAX - amount {
            return Err(anyhow!(
                "tried to put too many tokens in a marking for place {}",
                place
            ));
        }

        self.place2token[place] += amount;
        Ok(())
    }

    pub fn decrease(&mut self, place: usize, amount: u64) -> Result<()> {
        if self.place2token[place] < amount {
            return Err(anyhow!(
                "tried to obtain a negative number of tokens in a marking for place {}",
                place
            ));
        }
        self.place2token[place] -= amount;
        Ok(())
    }

    pub fn add_place(&mut self) {
        self.place2token.push(0);
    }

    pub fn is_empty(&self) -> bool {
        self.place2token.iter().all(|tokens| *tokens == 0)
    }

    /// Iterates over the places that carry at least one token.
    pub fn marked_places(&self) -> impl Iterator<Item = usize> + '_ {
        self.place2token
            .iter()
            .enumerate()
            .filter_map(|(place, tokens)| if *tokens > 0 { Some(place) } else { None })
    }
}

impl From<Vec<u64>> for Marking {
    fn from(value: Vec<u64>) -> Self {
        Self { place2token: value }
    }
}

impl Display for Marking {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        let mut first = true;
        for (place, multiplicity) in self.place2token.iter().enumerate() {
            if *multiplicity > 0 {
                if !first {
                    write!(f, ", ")?;
                }
                first = false;
                write!(f, "{}:{}", place, multiplicity)?;
            }
        }
        write!(f, "}}")
    }
}

impl Debug for Marking {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::Marking;

    #[test]
    fn marking_tokens() {
        let mut marking = Marking::new(3);
        assert!(marking.is_empty());

        marking.increase(1, 2).unwrap();
        assert_eq!(marking.get_tokens(1), 2);
        assert_eq!(marking.marked_places().collect::<Vec<_>>(), vec![1]);
        assert_eq!(marking.to_string(), "{1:2}");

        assert!(marking.decrease(0, 1).is_err());
        marking.decrease(1, 2).unwrap();
        assert!(marking.is_empty());
    }
}
