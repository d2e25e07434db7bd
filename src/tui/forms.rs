//! Form state for the sign-in, sign-up, new-todo and add-task screens.
//!
//! Each form keeps its fields in visual order behind a `current_field`
//! index and ordering constants, so input dispatch and rendering agree
//! on which field is which.

use crate::tui::input::InputField;

/// Global order constants for sign-in form fields.
pub const SIGNIN_EMAIL_GLOBAL_ORDER: usize = 0;
pub const SIGNIN_PASSWORD_GLOBAL_ORDER: usize = 1;
pub const SIGNIN_REMEMBER_GLOBAL_ORDER: usize = 2;

/// Sign-in form with a remember-me selector.
pub struct SignInForm {
    pub email: InputField,
    pub password: InputField,
    pub remember: bool,
    pub current_field: usize,
}

impl SignInForm {
    /// Create an empty sign-in form focused on the email field.
    pub fn new() -> Self {
        let mut form = Self {
            email: InputField::new(),
            password: InputField::new(),
            remember: false,
            current_field: SIGNIN_EMAIL_GLOBAL_ORDER,
        };
        form.update_active_field();
        form
    }

    pub fn field_count(&self) -> usize {
        3
    }

    /// Move to the next field in the form.
    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % self.field_count();
        self.update_active_field();
    }

    /// Move to the previous field in the form.
    pub fn prev_field(&mut self) {
        self.current_field = if self.current_field == 0 {
            self.field_count() - 1
        } else {
            self.current_field - 1
        };
        self.update_active_field();
    }

    /// Update which field is currently active for editing.
    pub fn update_active_field(&mut self) {
        self.email.active = self.current_field == SIGNIN_EMAIL_GLOBAL_ORDER;
        self.password.active = self.current_field == SIGNIN_PASSWORD_GLOBAL_ORDER;
    }

    fn active_input_mut(&mut self) -> Option<&mut InputField> {
        match self.current_field {
            SIGNIN_EMAIL_GLOBAL_ORDER => Some(&mut self.email),
            SIGNIN_PASSWORD_GLOBAL_ORDER => Some(&mut self.password),
            _ => None,
        }
    }

    /// Handle character input for the currently active field.
    pub fn handle_char(&mut self, c: char) {
        if self.current_field == SIGNIN_REMEMBER_GLOBAL_ORDER {
            if c == ' ' {
                self.remember = !self.remember;
            }
        } else if let Some(field) = self.active_input_mut() {
            field.handle_char(c);
        }
    }

    /// Handle backspace input for the currently active field.
    pub fn handle_backspace(&mut self) {
        if let Some(field) = self.active_input_mut() {
            field.handle_backspace();
        }
    }

    /// Handle left/right arrow keys for cursor movement or the selector.
    pub fn handle_left_right(&mut self, right: bool) {
        if self.current_field == SIGNIN_REMEMBER_GLOBAL_ORDER {
            self.remember = !self.remember;
        } else if let Some(field) = self.active_input_mut() {
            if right {
                field.move_cursor_right();
            } else {
                field.move_cursor_left();
            }
        }
    }
}

/// Global order constants for sign-up form fields.
pub const SIGNUP_NAME_GLOBAL_ORDER: usize = 0;
pub const SIGNUP_EMAIL_GLOBAL_ORDER: usize = 1;
pub const SIGNUP_PASSWORD_GLOBAL_ORDER: usize = 2;
pub const SIGNUP_RE_PASSWORD_GLOBAL_ORDER: usize = 3;

/// Sign-up form for creating an account.
pub struct SignUpForm {
    pub name: InputField,
    pub email: InputField,
    pub password: InputField,
    pub re_password: InputField,
    pub current_field: usize,
}

impl SignUpForm {
    /// Create an empty sign-up form focused on the name field.
    pub fn new() -> Self {
        let mut form = Self {
            name: InputField::new(),
            email: InputField::new(),
            password: InputField::new(),
            re_password: InputField::new(),
            current_field: SIGNUP_NAME_GLOBAL_ORDER,
        };
        form.update_active_field();
        form
    }

    pub fn field_count(&self) -> usize {
        4
    }

    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % self.field_count();
        self.update_active_field();
    }

    pub fn prev_field(&mut self) {
        self.current_field = if self.current_field == 0 {
            self.field_count() - 1
        } else {
            self.current_field - 1
        };
        self.update_active_field();
    }

    pub fn update_active_field(&mut self) {
        self.name.active = self.current_field == SIGNUP_NAME_GLOBAL_ORDER;
        self.email.active = self.current_field == SIGNUP_EMAIL_GLOBAL_ORDER;
        self.password.active = self.current_field == SIGNUP_PASSWORD_GLOBAL_ORDER;
        self.re_password.active = self.current_field == SIGNUP_RE_PASSWORD_GLOBAL_ORDER;
    }

    fn active_input_mut(&mut self) -> Option<&mut InputField> {
        match self.current_field {
            SIGNUP_NAME_GLOBAL_ORDER => Some(&mut self.name),
            SIGNUP_EMAIL_GLOBAL_ORDER => Some(&mut self.email),
            SIGNUP_PASSWORD_GLOBAL_ORDER => Some(&mut self.password),
            SIGNUP_RE_PASSWORD_GLOBAL_ORDER => Some(&mut self.re_password),
            _ => None,
        }
    }

    pub fn handle_char(&mut self, c: char) {
        if let Some(field) = self.active_input_mut() {
            field.handle_char(c);
        }
    }

    pub fn handle_backspace(&mut self) {
        if let Some(field) = self.active_input_mut() {
            field.handle_backspace();
        }
    }

    pub fn handle_left_right(&mut self, right: bool) {
        if let Some(field) = self.active_input_mut() {
            if right {
                field.move_cursor_right();
            } else {
                field.move_cursor_left();
            }
        }
    }
}

/// Global order constants for the new-todo form fields.
pub const TODO_TITLE_GLOBAL_ORDER: usize = 0;
pub const TODO_IMAGE_GLOBAL_ORDER: usize = 1;

/// Form for creating a todo list with its cover image.
pub struct TodoForm {
    pub title: InputField,
    pub image: InputField,
    pub current_field: usize,
}

impl TodoForm {
    pub fn new() -> Self {
        let mut form = Self {
            title: InputField::new(),
            image: InputField::new(),
            current_field: TODO_TITLE_GLOBAL_ORDER,
        };
        form.update_active_field();
        form
    }

    pub fn field_count(&self) -> usize {
        2
    }

    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % self.field_count();
        self.update_active_field();
    }

    pub fn prev_field(&mut self) {
        self.current_field = if self.current_field == 0 {
            self.field_count() - 1
        } else {
            self.current_field - 1
        };
        self.update_active_field();
    }

    pub fn update_active_field(&mut self) {
        self.title.active = self.current_field == TODO_TITLE_GLOBAL_ORDER;
        self.image.active = self.current_field == TODO_IMAGE_GLOBAL_ORDER;
    }

    fn active_input_mut(&mut self) -> &mut InputField {
        match self.current_field {
            TODO_IMAGE_GLOBAL_ORDER => &mut self.image,
            _ => &mut self.title,
        }
    }

    pub fn handle_char(&mut self, c: char) {
        self.active_input_mut().handle_char(c);
    }

    pub fn handle_backspace(&mut self) {
        self.active_input_mut().handle_backspace();
    }

    pub fn handle_left_right(&mut self, right: bool) {
        let field = self.active_input_mut();
        if right {
            field.move_cursor_right();
        } else {
            field.move_cursor_left();
        }
    }
}

/// Global order constants for the add-task row at the bottom of a list.
pub const TASK_TEXT_GLOBAL_ORDER: usize = 0;
pub const TASK_DUE_GLOBAL_ORDER: usize = 1;

/// Entry row for appending a task to the open todo list.
pub struct TaskEntryForm {
    pub text: InputField,
    pub due: InputField,
    pub current_field: usize,
}

impl TaskEntryForm {
    pub fn new() -> Self {
        let mut form = Self {
            text: InputField::new(),
            due: InputField::new(),
            current_field: TASK_TEXT_GLOBAL_ORDER,
        };
        form.update_active_field();
        form
    }

    pub fn field_count(&self) -> usize {
        2
    }

    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % self.field_count();
        self.update_active_field();
    }

    pub fn prev_field(&mut self) {
        self.current_field = if self.current_field == 0 {
            self.field_count() - 1
        } else {
            self.current_field - 1
        };
        self.update_active_field();
    }

    pub fn update_active_field(&mut self) {
        self.text.active = self.current_field == TASK_TEXT_GLOBAL_ORDER;
        self.due.active = self.current_field == TASK_DUE_GLOBAL_ORDER;
    }

    fn active_input_mut(&mut self) -> &mut InputField {
        match self.current_field {
            TASK_DUE_GLOBAL_ORDER => &mut self.due,
            _ => &mut self.text,
        }
    }

    pub fn handle_char(&mut self, c: char) {
        self.active_input_mut().handle_char(c);
    }

    pub fn handle_backspace(&mut self) {
        self.active_input_mut().handle_backspace();
    }

    pub fn handle_left_right(&mut self, right: bool) {
        let field = self.active_input_mut();
        if right {
            field.move_cursor_right();
        } else {
            field.move_cursor_left();
        }
    }

    /// Reset both fields after a successful submit.
    pub fn clear(&mut self) {
        self.text.clear();
        self.due.clear();
        self.current_field = TASK_TEXT_GLOBAL_ORDER;
        self.update_active_field();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signin_field_cycle_wraps() {
        let mut form = SignInForm::new();
        assert_eq!(form.current_field, SIGNIN_EMAIL_GLOBAL_ORDER);
        form.next_field();
        form.next_field();
        assert_eq!(form.current_field, SIGNIN_REMEMBER_GLOBAL_ORDER);
        form.next_field();
        assert_eq!(form.current_field, SIGNIN_EMAIL_GLOBAL_ORDER);
        form.prev_field();
        assert_eq!(form.current_field, SIGNIN_REMEMBER_GLOBAL_ORDER);
    }

    #[test]
    fn test_signin_remember_toggles_with_space() {
        let mut form = SignInForm::new();
        form.current_field = SIGNIN_REMEMBER_GLOBAL_ORDER;
        form.update_active_field();
        assert!(!form.remember);
        form.handle_char(' ');
        assert!(form.remember);
        form.handle_left_right(true);
        assert!(!form.remember);
        // Other characters leave the selector alone.
        form.handle_char('x');
        assert!(!form.remember);
    }

    #[test]
    fn test_signup_typing_targets_active_field() {
        let mut form = SignUpForm::new();
        form.handle_char('d');
        form.next_field();
        form.handle_char('e');
        assert_eq!(form.name.value, "d");
        assert_eq!(form.email.value, "e");
        assert!(form.email.active);
        assert!(!form.name.active);
    }

    #[test]
    fn test_task_entry_clear_resets_focus() {
        let mut form = TaskEntryForm::new();
        form.handle_char('m');
        form.next_field();
        form.handle_char('t');
        form.clear();
        assert_eq!(form.text.value, "");
        assert_eq!(form.due.value, "");
        assert_eq!(form.current_field, TASK_TEXT_GLOBAL_ORDER);
        assert!(form.text.active);
    }
}
