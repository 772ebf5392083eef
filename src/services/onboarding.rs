//! The first-run wizard.
//!
//! Steps run strictly in order: welcome, account, categories, final. Only
//! the account and categories steps can go back, and only by one step.
//! Leaving the final step completes onboarding for the financial group.

use serde::{Deserialize, Serialize};

use crate::models::CategoryType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OnboardingStep {
    #[default]
    Welcome,
    Account,
    Categories,
    Final,
}

impl OnboardingStep {
    pub const ALL: [OnboardingStep; 4] = [
        OnboardingStep::Welcome,
        OnboardingStep::Account,
        OnboardingStep::Categories,
        OnboardingStep::Final,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OnboardingStep::Welcome => "welcome",
            OnboardingStep::Account => "account",
            OnboardingStep::Categories => "categories",
            OnboardingStep::Final => "final",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "welcome" => Some(OnboardingStep::Welcome),
            "account" => Some(OnboardingStep::Account),
            "categories" => Some(OnboardingStep::Categories),
            "final" => Some(OnboardingStep::Final),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            OnboardingStep::Welcome => "Boas-vindas",
            OnboardingStep::Account => "Grupo financeiro",
            OnboardingStep::Categories => "Categorias",
            OnboardingStep::Final => "Tudo pronto",
        }
    }

    /// 1-based position, for progress display.
    pub fn number(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).map_or(0, |i| i + 1)
    }

    /// The following step, or `None` from the final step.
    pub fn next(&self) -> Option<Self> {
        match self {
            OnboardingStep::Welcome => Some(OnboardingStep::Account),
            OnboardingStep::Account => Some(OnboardingStep::Categories),
            OnboardingStep::Categories => Some(OnboardingStep::Final),
            OnboardingStep::Final => None,
        }
    }

    /// The previous step, where going back is allowed.
    pub fn back(&self) -> Option<Self> {
        match self {
            OnboardingStep::Account => Some(OnboardingStep::Welcome),
            OnboardingStep::Categories => Some(OnboardingStep::Account),
            OnboardingStep::Welcome | OnboardingStep::Final => None,
        }
    }

    pub fn can_go_back(&self) -> bool {
        self.back().is_some()
    }
}

impl std::fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub const MAX_GROUP_NAME_LEN: usize = 100;

/// Trim and check a financial group name.
pub fn validate_group_name(name: &str) -> Result<String, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Informe um nome para o grupo financeiro".into());
    }
    if name.chars().count() > MAX_GROUP_NAME_LEN {
        return Err(format!(
            "O nome do grupo deve ter no máximo {} caracteres",
            MAX_GROUP_NAME_LEN
        ));
    }
    Ok(name.to_string())
}

/// A root category with its children, seeded by the categories step.
#[derive(Debug, Clone, Copy)]
pub struct DefaultCategory {
    pub name: &'static str,
    pub category_type: CategoryType,
    pub color: &'static str,
    pub icon: &'static str,
    pub children: &'static [&'static str],
}

pub const DEFAULT_CATEGORIES: &[DefaultCategory] = &[
    DefaultCategory {
        name: "Moradia",
        category_type: CategoryType::Expense,
        color: "#3b82f6",
        icon: "house",
        children: &["Aluguel", "Condomínio", "Energia", "Água", "Internet"],
    },
    DefaultCategory {
        name: "Alimentação",
        category_type: CategoryType::Expense,
        color: "#f97316",
        icon: "utensils",
        children: &["Mercado", "Restaurantes", "Padaria"],
    },
    DefaultCategory {
        name: "Transporte",
        category_type: CategoryType::Expense,
        color: "#eab308",
        icon: "car",
        children: &["Combustível", "Ônibus", "Manutenção"],
    },
    DefaultCategory {
        name: "Saúde",
        category_type: CategoryType::Expense,
        color: "#ef4444",
        icon: "heart-pulse",
        children: &["Plano de saúde", "Farmácia"],
    },
    DefaultCategory {
        name: "Lazer",
        category_type: CategoryType::Expense,
        color: "#a855f7",
        icon: "party-popper",
        children: &[],
    },
    DefaultCategory {
        name: "Salário",
        category_type: CategoryType::Income,
        color: "#22c55e",
        icon: "wallet",
        children: &[],
    },
    DefaultCategory {
        name: "Outras receitas",
        category_type: CategoryType::Income,
        color: "#14b8a6",
        icon: "coins",
        children: &["Rendimentos", "Reembolsos"],
    },
];
