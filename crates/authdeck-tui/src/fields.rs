//! Email/password input fields.
//!
//! Plain end-of-line editing; which field accepts input at any moment is
//! decided by the reducer from the derived enablement, not here.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Email,
    Password,
}

#[derive(Debug, Default, Clone)]
pub struct FieldsState {
    pub email: String,
    pub password: String,
}

impl FieldsState {
    pub fn insert(&mut self, field: Field, c: char) {
        if c.is_control() {
            return;
        }
        self.buffer_mut(field).push(c);
    }

    pub fn backspace(&mut self, field: Field) {
        self.buffer_mut(field).pop();
    }

    pub fn clear(&mut self, field: Field) {
        self.buffer_mut(field).clear();
    }

    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Email => &self.email,
            Field::Password => &self.password,
        }
    }

    fn buffer_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Email => &mut self.email,
            Field::Password => &mut self.password,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_backspace() {
        let mut fields = FieldsState::default();
        for c in "a@b".chars() {
            fields.insert(Field::Email, c);
        }
        fields.insert(Field::Password, 'x');
        assert_eq!(fields.email, "a@b");
        assert_eq!(fields.password, "x");

        fields.backspace(Field::Email);
        assert_eq!(fields.email, "a@");
        fields.backspace(Field::Password);
        fields.backspace(Field::Password); // empty pop is a no-op
        assert_eq!(fields.password, "");
    }

    #[test]
    fn test_control_chars_are_ignored() {
        let mut fields = FieldsState::default();
        fields.insert(Field::Email, '\n');
        fields.insert(Field::Email, '\t');
        assert!(fields.email.is_empty());
    }
}
