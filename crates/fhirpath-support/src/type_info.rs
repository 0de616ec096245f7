use std::fmt;

/// Namespace-qualified type name attached to evaluation results.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeInfoResult {
    pub namespace: String,
    pub name: String,
}

impl TypeInfoResult {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    /// Type info for a FHIR model type, e.g. `FHIR.dateTime`.
    pub fn fhir(name: &str) -> Self {
        Self::new("FHIR", name)
    }

    /// Type info for a FHIRPath system type, e.g. `System.String`.
    pub fn system(name: &str) -> Self {
        Self::new("System", name)
    }
}

impl fmt::Display for TypeInfoResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

/// One declared element of a [`ClassInfo`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfoElement {
    pub name: String,
    /// Qualified names of every type the element may hold. Choice elements
    /// list each allowed type; every other element lists exactly one.
    pub type_names: Vec<String>,
    pub is_list: bool,
}

/// Static shape of a model type, available without an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo {
    pub namespace: String,
    pub name: String,
    pub base_type: Option<String>,
    pub elements: Vec<ClassInfoElement>,
}

impl ClassInfo {
    pub fn element(&self, name: &str) -> Option<&ClassInfoElement> {
        self.elements.iter().find(|e| e.name == name)
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }
}

impl fmt::Display for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)?;
        if let Some(base) = &self.base_type {
            write!(f, " : {}", base)?;
        }
        writeln!(f)?;
        for element in &self.elements {
            let list = if element.is_list { " [*]" } else { "" };
            writeln!(
                f,
                "  {}: {}{}",
                element.name,
                element.type_names.join(" | "),
                list
            )?;
        }
        Ok(())
    }
}
