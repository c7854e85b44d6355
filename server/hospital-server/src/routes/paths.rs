//! Route path constants (axum syntax)

pub mod health {
    pub const HEALTH: &str = "/health";
}

pub mod token {
    pub const OBTAIN: &str = "/api/token/";
    pub const REFRESH: &str = "/api/token/refresh/";
}

pub mod patients {
    pub const COLLECTION: &str = "/api/patients/";
    pub const BY_ID: &str = "/api/patients/:id/";
    pub const CONSULTATIONS: &str = "/api/patients/:id/consultations/";
    pub const FACTURATIONS: &str = "/api/patients/:id/facturations/";
    pub const RENDEZ_VOUS: &str = "/api/patients/:id/rendez_vous/";
}

pub mod medecins {
    pub const COLLECTION: &str = "/api/medecins/";
    pub const BY_ID: &str = "/api/medecins/:id/";
    pub const CONSULTATIONS: &str = "/api/medecins/:id/consultations/";
    pub const RENDEZ_VOUS: &str = "/api/medecins/:id/rendez_vous/";
}

pub mod rendez_vous {
    pub const COLLECTION: &str = "/api/rendez-vous/";
    pub const BY_ID: &str = "/api/rendez-vous/:id/";
    pub const CONFIRMER: &str = "/api/rendez-vous/:id/confirmer/";
    pub const ANNULER: &str = "/api/rendez-vous/:id/annuler/";
}

pub mod consultations {
    pub const COLLECTION: &str = "/api/consultations/";
    pub const BY_ID: &str = "/api/consultations/:id/";
    pub const ORDONNANCE: &str = "/api/consultations/:id/ordonnance/";
}

pub mod medicaments {
    pub const COLLECTION: &str = "/api/medicaments/";
    pub const BY_ID: &str = "/api/medicaments/:id/";
}

pub mod ordonnances {
    pub const COLLECTION: &str = "/api/ordonnances/";
    pub const BY_ID: &str = "/api/ordonnances/:id/";
    pub const AJOUTER_MEDICAMENT: &str = "/api/ordonnances/:id/ajouter_medicament/";
}

pub mod facturations {
    pub const COLLECTION: &str = "/api/facturations/";
    pub const BY_ID: &str = "/api/facturations/:id/";
    pub const ENREGISTRER_PAIEMENT: &str = "/api/facturations/:id/enregistrer_paiement/";
    pub const STATISTIQUES: &str = "/api/facturations/statistiques/";
}
